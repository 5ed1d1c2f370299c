/*!
 * Masked Executor
 *
 * Runs a computation under a temporary signal mask of the calling thread
 * and restores the previous mask before handing back the outcome.
 *
 * Order of operations for every call:
 * 1. Resolve the requested names
 * 2. Swap the mask in one `pthread_sigmask` call, keeping the old one
 * 3. Run the computation once, capturing its value, error or panic
 * 4. Install the old mask again (full snapshot)
 * 5. Return the value, return the error, or resume the panic
 */

use crate::core::config::MaskOptions;
use crate::core::errors::ExecError;
use crate::core::guard::SignalMaskGuard;
use crate::signals::mask::{MaskMode, MaskPlatform, ThreadMask};
use crate::signals::names::{resolve, SignalSet};
use std::panic::{self, AssertUnwindSafe};
use tracing::{error, instrument};

/// Result type of a masked execution
pub type ExecResult<T, E> = Result<T, ExecError<E>>;

/// Builder for one masked execution
///
/// # Example
///
/// ```rust
/// use masked_exec::MaskedCall;
///
/// let sum = MaskedCall::new()
///     .sigset(["INT", "TERM"])
///     .run_with(|(a, b): (i32, i32)| Ok::<_, String>(a + b), (2, 3))
///     .unwrap();
/// assert_eq!(sum, 5);
/// ```
pub struct MaskedCall<'p, P: MaskPlatform + ?Sized = ThreadMask> {
    sigset: Vec<String>,
    replace_mask: bool,
    platform: &'p P,
}

impl MaskedCall<'static, ThreadMask> {
    /// Call with no signals requested, in additive mode
    pub fn new() -> Self {
        Self {
            sigset: Vec::new(),
            replace_mask: false,
            platform: &ThreadMask,
        }
    }

    pub fn from_options(options: &MaskOptions) -> Self {
        Self::new()
            .sigset(&options.sigset)
            .replace_mask(options.replace_mask)
    }
}

impl<P: MaskPlatform + ?Sized> std::fmt::Debug for MaskedCall<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskedCall")
            .field("sigset", &self.sigset)
            .field("replace_mask", &self.replace_mask)
            .finish_non_exhaustive()
    }
}

impl Default for MaskedCall<'static, ThreadMask> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p, P: MaskPlatform + ?Sized> MaskedCall<'p, P> {
    /// Add signal names to block
    pub fn sigset<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sigset
            .extend(names.into_iter().map(|n| n.as_ref().to_string()));
        self
    }

    /// Add one signal name to block
    pub fn signal(mut self, name: impl Into<String>) -> Self {
        self.sigset.push(name.into());
        self
    }

    pub fn replace_mask(mut self, replace_mask: bool) -> Self {
        self.replace_mask = replace_mask;
        self
    }

    /// Run against a different mask primitive
    pub fn with_platform<'q, Q: MaskPlatform + ?Sized>(self, platform: &'q Q) -> MaskedCall<'q, Q> {
        MaskedCall {
            sigset: self.sigset,
            replace_mask: self.replace_mask,
            platform,
        }
    }

    #[inline]
    pub fn mode(&self) -> MaskMode {
        MaskMode::from_replace(self.replace_mask)
    }

    pub fn requested(&self) -> &[String] {
        &self.sigset
    }

    /// Signals this call would put in the new mask
    pub fn resolved(&self) -> SignalSet {
        resolve(&self.sigset)
    }

    /// Run `computation` under the temporary mask
    pub fn run<T, E, F>(&self, computation: F) -> ExecResult<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        execute(self.platform, self.mode(), &self.resolved(), computation)
    }

    /// Run `computation(args)` under the temporary mask
    pub fn run_with<A, T, E, F>(&self, computation: F, args: A) -> ExecResult<T, E>
    where
        F: FnOnce(A) -> Result<T, E>,
    {
        self.run(move || computation(args))
    }
}

/// Run `computation` with `signal_names` blocked
///
/// With `replace_mask` false the names are added to the current mask; with
/// it true they become the whole mask for the duration of the call.
pub fn run_masked<T, E, F, I, S>(computation: F, signal_names: I, replace_mask: bool) -> ExecResult<T, E>
where
    F: FnOnce() -> Result<T, E>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let requested = resolve(signal_names);
    execute(&ThreadMask, MaskMode::from_replace(replace_mask), &requested, computation)
}

/// [`run_masked`] with arguments forwarded to the computation
pub fn run_masked_with<A, T, E, F, I, S>(
    computation: F,
    args: A,
    signal_names: I,
    replace_mask: bool,
) -> ExecResult<T, E>
where
    F: FnOnce(A) -> Result<T, E>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    run_masked(move || computation(args), signal_names, replace_mask)
}

/// Swap, run, restore, then surface the outcome
#[instrument(level = "debug", skip_all, fields(mode = ?mode, signals = requested.len()))]
pub(crate) fn execute<P, T, E, F>(
    platform: &P,
    mode: MaskMode,
    requested: &SignalSet,
    computation: F,
) -> ExecResult<T, E>
where
    P: MaskPlatform + ?Sized,
    F: FnOnce() -> Result<T, E>,
{
    let guard = SignalMaskGuard::install(platform, mode, &requested.to_mask())?;

    let outcome = panic::catch_unwind(AssertUnwindSafe(computation));
    let restored = guard.restore();

    match outcome {
        Ok(Ok(value)) => match restored {
            Ok(()) => Ok(value),
            Err(e) => Err(ExecError::from(e)),
        },
        Ok(Err(e)) => {
            if let Err(restore_err) = restored {
                error!(error = %restore_err, "mask restore failed after computation error");
            }
            Err(ExecError::Computation(e))
        }
        Err(payload) => {
            if let Err(restore_err) = restored {
                error!(error = %restore_err, "mask restore failed after computation panic");
            }
            panic::resume_unwind(payload)
        }
    }
}
