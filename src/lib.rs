/*!
 * Masked Execution
 *
 * Run a computation with some signals blocked on the calling thread, and
 * get the previous signal mask back no matter how the computation ends.
 *
 * ```rust
 * use masked_exec::run_masked;
 *
 * let answer = run_masked(|| Ok::<_, String>(42), ["INT", "TERM"], false).unwrap();
 * assert_eq!(answer, 42);
 * ```
 */

pub mod core;
pub mod executor;
pub mod monitoring;
pub mod signals;

// Re-exports
pub use crate::core::{ExecError, MaskError, MaskOptions, MaskResult, PreconditionError};
pub use executor::{run_masked, run_masked_with, ExecResult, MaskedCall, Registry};
pub use monitoring::init_tracing;
pub use signals::{
    current_mask, mask_contains, resolve, MaskMode, MaskPlatform, SignalSet, ThreadMask,
};

/// Signal and mask types from `nix`
pub use nix::sys::signal::{SigSet, Signal};
