/*!
 * Dynamic Invocation
 *
 * The option-bag form of the executor:
 *
 * ```json
 * { "code": "name", "args": [1, 2], "sigset": ["INT", "TERM"], "replace_mask": false }
 * ```
 *
 * `code` names a computation registered ahead of time. Every field is
 * checked before the signal mask is touched.
 */

use super::masked::{execute, ExecResult};
use crate::core::errors::PreconditionError;
use crate::signals::mask::{MaskMode, MaskPlatform, ThreadMask};
use crate::signals::names::resolve;
use ahash::AHashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Computation callable through a request
pub type Computation = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// A validated request, ready to run
#[derive(Clone)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<Value>,
    pub sigset: Vec<String>,
    pub replace_mask: bool,
    code: Computation,
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("name", &self.name)
            .field("args", &self.args)
            .field("sigset", &self.sigset)
            .field("replace_mask", &self.replace_mask)
            .finish_non_exhaustive()
    }
}

/// Named computations plus the mask primitive they run under
pub struct Registry {
    computations: AHashMap<String, Computation>,
    platform: Box<dyn MaskPlatform>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_platform(Box::new(ThreadMask))
    }

    pub fn with_platform(platform: Box<dyn MaskPlatform>) -> Self {
        Self {
            computations: AHashMap::new(),
            platform,
        }
    }

    /// Register `code` under `name`, replacing any previous entry
    pub fn register<F>(&mut self, name: impl Into<String>, code: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.computations.insert(name.into(), Arc::new(code));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.computations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.computations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.computations.is_empty()
    }

    /// Check the shape of a request without running anything
    pub fn prepare(&self, request: &Value) -> Result<Invocation, PreconditionError> {
        let fields = request.as_object().ok_or(PreconditionError::NotObject)?;

        let (name, code) = self.lookup(fields)?;
        let args = parse_args(fields)?;
        let sigset = parse_sigset(fields)?;
        let replace_mask = parse_replace_mask(fields)?;

        Ok(Invocation {
            name,
            args,
            sigset,
            replace_mask,
            code,
        })
    }

    /// Validate and run a request
    pub fn invoke(&self, request: &Value) -> ExecResult<Value, String> {
        let invocation = self.prepare(request)?;
        self.run(&invocation)
    }

    /// Run an already validated request
    pub fn run(&self, invocation: &Invocation) -> ExecResult<Value, String> {
        debug!(
            code = %invocation.name,
            args = invocation.args.len(),
            replace_mask = invocation.replace_mask,
            "invoking registered computation"
        );

        let requested = resolve(&invocation.sigset);
        execute(
            self.platform.as_ref(),
            MaskMode::from_replace(invocation.replace_mask),
            &requested,
            || (invocation.code)(invocation.args.as_slice()),
        )
    }

    fn lookup(&self, fields: &Map<String, Value>) -> Result<(String, Computation), PreconditionError> {
        let name = match fields.get("code") {
            Some(Value::String(name)) => name,
            Some(other) => return Err(PreconditionError::NotInvocable(other.to_string())),
            None => return Err(PreconditionError::NotInvocable("<missing>".to_string())),
        };

        self.computations
            .get(name)
            .map(|code| (name.clone(), Arc::clone(code)))
            .ok_or_else(|| PreconditionError::NotInvocable(name.clone()))
    }
}

fn parse_args(fields: &Map<String, Value>) -> Result<Vec<Value>, PreconditionError> {
    match fields.get("args") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(PreconditionError::ArgsNotSequence),
    }
}

fn parse_sigset(fields: &Map<String, Value>) -> Result<Vec<String>, PreconditionError> {
    let items = match fields.get("sigset") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(PreconditionError::SigsetNotSequence),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.as_str()
                .map(str::to_string)
                .ok_or(PreconditionError::SignalNameNotString { index })
        })
        .collect()
}

fn parse_replace_mask(fields: &Map<String, Value>) -> Result<bool, PreconditionError> {
    match fields.get("replace_mask") {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(replace)) => Ok(*replace),
        Some(_) => Err(PreconditionError::ReplaceMaskNotBool),
    }
}
