/*!
 * Mask Options
 *
 * Serializable call options, with defaults and environment overrides
 *
 * Environment variables:
 * - MASKED_EXEC_SIGSET: Comma-separated signal names (default: empty)
 * - MASKED_EXEC_REPLACE_MASK: Replace instead of extend the mask (default: false)
 */

use serde::{Deserialize, Serialize};

pub const ENV_SIGSET: &str = "MASKED_EXEC_SIGSET";
pub const ENV_REPLACE_MASK: &str = "MASKED_EXEC_REPLACE_MASK";

/// Which signals to block around a call and how
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskOptions {
    /// Signal names, uppercase without the `SIG` prefix
    pub sigset: Vec<String>,
    /// Replace the current mask instead of adding to it
    pub replace_mask: bool,
}

impl MaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sigset.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn replacing(mut self, replace_mask: bool) -> Self {
        self.replace_mask = replace_mask;
        self
    }

    /// Options from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Options from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let sigset = lookup(ENV_SIGSET)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let replace_mask = lookup(ENV_REPLACE_MASK)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            sigset,
            replace_mask,
        }
    }
}
