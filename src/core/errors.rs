/*!
 * Error Types
 * Centralized error handling with thiserror and miette
 */

use crate::core::guard::GuardError;
use miette::Diagnostic;
use nix::errno::Errno;
use std::fmt;
use thiserror::Error;

/// Result type for signal mask platform operations
pub type MaskResult<T> = Result<T, MaskError>;

/// Failures of the underlying signal mask primitive
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Diagnostic)]
pub enum MaskError {
    #[error("Failed to install signal mask: {0}")]
    #[diagnostic(
        code(mask::swap_failed),
        help("The computation was not run. The thread mask is unchanged.")
    )]
    Swap(Errno),

    #[error("Failed to restore signal mask: {0}")]
    #[diagnostic(
        code(mask::restore_failed),
        help("The calling thread may still run under the temporary mask.")
    )]
    Restore(Errno),

    #[error("Failed to query signal mask: {0}")]
    #[diagnostic(code(mask::query_failed))]
    Query(Errno),
}

impl MaskError {
    /// Underlying OS error number
    pub fn errno(&self) -> Errno {
        match self {
            MaskError::Swap(e) | MaskError::Restore(e) | MaskError::Query(e) => *e,
        }
    }
}

/// Malformed invocation, rejected before the mask is touched
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum PreconditionError {
    #[error("Request must be an object")]
    #[diagnostic(
        code(request::not_object),
        help("Pass {{\"code\": ..., \"args\": [...], \"sigset\": [...], \"replace_mask\": false}}.")
    )]
    NotObject,

    #[error("Not an invocable computation: {0}")]
    #[diagnostic(
        code(request::not_invocable),
        help("`code` must name a computation registered with the registry.")
    )]
    NotInvocable(String),

    #[error("`args` must be an array")]
    #[diagnostic(code(request::args_not_sequence))]
    ArgsNotSequence,

    #[error("`sigset` must be an array of signal names")]
    #[diagnostic(code(request::sigset_not_sequence))]
    SigsetNotSequence,

    #[error("`sigset` entry {index} is not a string")]
    #[diagnostic(
        code(request::signal_name_not_string),
        help("Signal names are strings such as \"INT\" or \"TERM\".")
    )]
    SignalNameNotString { index: usize },

    #[error("`replace_mask` must be a boolean")]
    #[diagnostic(code(request::replace_mask_not_bool))]
    ReplaceMaskNotBool,
}

/// Outcome error of a masked execution
///
/// `Computation` carries the caller's error untouched; the other variants
/// are produced by the executor itself.
#[derive(Error, Debug)]
pub enum ExecError<E> {
    #[error("Invalid invocation: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Signal mask error: {0}")]
    Platform(#[from] MaskError),

    #[error("Signal mask guard error: {0}")]
    Guard(GuardError),

    #[error("Computation failed: {0}")]
    Computation(E),
}

impl<E> From<GuardError> for ExecError<E> {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Mask(e) => ExecError::Platform(e),
            other => ExecError::Guard(other),
        }
    }
}

// Written out rather than derived: the derive cannot bound `E`, and the
// executor's own variants should keep their codes for any `E`.
impl<E> Diagnostic for ExecError<E>
where
    E: fmt::Debug + fmt::Display,
{
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            ExecError::Precondition(e) => e.code(),
            ExecError::Platform(e) => e.code(),
            ExecError::Guard(e) => e.code(),
            ExecError::Computation(_) => Some(Box::new("exec::computation_failed")),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            ExecError::Precondition(e) => e.help(),
            ExecError::Platform(e) => e.help(),
            ExecError::Guard(e) => e.help(),
            ExecError::Computation(_) => {
                Some(Box::new("The signal mask was restored before this error surfaced."))
            }
        }
    }
}

impl<E> ExecError<E> {
    /// Take the computation error back out, if that is what this is
    pub fn into_computation(self) -> Option<E> {
        match self {
            ExecError::Computation(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_computation(&self) -> bool {
        matches!(self, ExecError::Computation(_))
    }
}

impl<E: PartialEq> PartialEq for ExecError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ExecError::Precondition(a), ExecError::Precondition(b)) => a == b,
            (ExecError::Platform(a), ExecError::Platform(b)) => a == b,
            (ExecError::Guard(a), ExecError::Guard(b)) => a == b,
            (ExecError::Computation(a), ExecError::Computation(b)) => a == b,
            _ => false,
        }
    }
}
