/*!
 * Scoped Resource Guards
 *
 * A guard owns the state needed to undo a temporary change and undoes it
 * exactly once, either through an explicit `release` or on drop.
 *
 * ## Guard Types
 *
 * - **SignalMaskGuard**: A saved thread signal mask, restored on release
 *
 * ## Example
 *
 * ```rust,ignore
 * let mut guard = SignalMaskGuard::install(&ThreadMask, MaskMode::Additive, &set)?;
 * // Runs with the temporary mask
 * guard.release()?; // Saved mask is back
 * ```
 */

mod mask;
mod traits;

pub use mask::SignalMaskGuard;
pub use traits::{Guard, GuardDrop};

use crate::core::errors::MaskError;

/// Result type for guard operations
pub type GuardResult<T> = Result<T, GuardError>;

/// Errors that can occur during guard operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum GuardError {
    #[error("Resource already released")]
    #[diagnostic(
        code(guard::already_released),
        help("The guard was released before this call; the saved state is already back.")
    )]
    AlreadyReleased,

    #[error("Operation failed: {0}")]
    #[diagnostic(transparent)]
    Mask(#[from] MaskError),
}

/// Guard metadata for observability
#[derive(Debug, Clone)]
pub struct GuardMetadata {
    pub resource_type: &'static str,
    pub creation_time: std::time::Instant,
}

impl GuardMetadata {
    #[inline]
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            creation_time: std::time::Instant::now(),
        }
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}
