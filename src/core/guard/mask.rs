/*!
 * Signal Mask Guards
 *
 * Holds the mask that was in effect before a temporary mask was installed
 * and puts it back exactly once
 */

use super::traits::{Guard, GuardDrop};
use super::{GuardError, GuardMetadata, GuardResult};
use crate::core::errors::MaskResult;
use crate::signals::mask::{MaskMode, MaskPlatform};
use nix::sys::signal::SigSet;
use tracing::{error, trace};

/// Saved signal mask with restore-once semantics
///
/// Restoring always installs the full saved snapshot with `SIG_SETMASK`,
/// never unblocks only what was added, so nested guards compose.
///
/// # Example
///
/// ```ignore
/// let guard = SignalMaskGuard::install(&ThreadMask, MaskMode::Additive, &set)?;
/// // ... work under the temporary mask ...
/// guard.restore()?;
/// ```
pub struct SignalMaskGuard<'p, P: MaskPlatform + ?Sized> {
    platform: &'p P,
    saved: SigSet,
    mode: MaskMode,
    metadata: GuardMetadata,
    active: bool,
}

impl<'p, P: MaskPlatform + ?Sized> SignalMaskGuard<'p, P> {
    /// Install `set` per `mode`, keeping the previous mask
    ///
    /// Nothing is saved when the swap fails, so there is nothing to restore.
    pub fn install(platform: &'p P, mode: MaskMode, set: &SigSet) -> MaskResult<Self> {
        let saved = platform.swap(mode, set)?;
        trace!(?mode, "temporary signal mask installed");

        Ok(Self {
            platform,
            saved,
            mode,
            metadata: GuardMetadata::new("signal_mask"),
            active: true,
        })
    }

    /// Mask in effect before the guard was installed
    #[inline]
    pub fn saved(&self) -> &SigSet {
        &self.saved
    }

    #[inline]
    pub fn mode(&self) -> MaskMode {
        self.mode
    }

    /// Put the saved mask back, consuming the guard
    ///
    /// Fails with `AlreadyReleased` if `release` already ran, and with the
    /// platform error if the install fails.
    pub fn restore(mut self) -> GuardResult<()> {
        self.release()
    }
}

impl<P: MaskPlatform + ?Sized> Guard for SignalMaskGuard<'_, P> {
    fn resource_type(&self) -> &'static str {
        "signal_mask"
    }

    fn metadata(&self) -> &GuardMetadata {
        &self.metadata
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn release(&mut self) -> GuardResult<()> {
        if !self.active {
            return Err(GuardError::AlreadyReleased);
        }

        // One attempt only, even if the install fails
        self.active = false;
        self.platform.install(&self.saved)?;

        trace!(
            resource = self.resource_type(),
            mode = ?self.mode,
            lifetime_micros = self.metadata().lifetime_micros(),
            "signal mask restored"
        );
        Ok(())
    }
}

impl<P: MaskPlatform + ?Sized> GuardDrop for SignalMaskGuard<'_, P> {
    fn on_drop(&mut self) {
        if self.active {
            if let Err(e) = self.release() {
                error!(
                    resource = self.metadata().resource_type,
                    error = %e,
                    "guard drop failed"
                );
            }
        }
    }
}

impl<P: MaskPlatform + ?Sized> Drop for SignalMaskGuard<'_, P> {
    fn drop(&mut self) {
        self.on_drop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::MaskError;
    use crate::signals::mask::{MockMaskPlatform, ThreadMask};
    use mockall::predicate::eq;
    use nix::errno::Errno;
    use nix::sys::signal::Signal;

    fn usr1() -> SigSet {
        let mut set = SigSet::empty();
        set.add(Signal::SIGUSR1);
        set
    }

    #[test]
    fn test_restore_puts_back_saved_mask() {
        let before = SigSet::thread_get_mask().unwrap();

        let guard = SignalMaskGuard::install(&ThreadMask, MaskMode::Additive, &usr1()).unwrap();
        assert_eq!(guard.saved(), &before);
        assert!(guard.is_active());
        assert!(SigSet::thread_get_mask().unwrap().contains(Signal::SIGUSR1));

        guard.restore().unwrap();
        assert_eq!(SigSet::thread_get_mask().unwrap(), before);
    }

    #[test]
    fn test_guard_metadata() {
        let guard = SignalMaskGuard::install(&ThreadMask, MaskMode::Additive, &usr1()).unwrap();
        assert_eq!(guard.resource_type(), "signal_mask");
        assert_eq!(guard.metadata().resource_type, guard.resource_type());
        guard.restore().unwrap();
    }

    #[test]
    fn test_restore_after_release_reports_it() {
        let mut platform = MockMaskPlatform::new();
        platform
            .expect_swap()
            .returning(|_, _| Ok(SigSet::empty()));
        platform.expect_install().times(1).returning(|_| Ok(()));

        let mut guard =
            SignalMaskGuard::install(&platform, MaskMode::Additive, &usr1()).unwrap();
        guard.release().unwrap();
        assert_eq!(guard.restore(), Err(GuardError::AlreadyReleased));
    }

    #[test]
    fn test_restore_surfaces_install_failure() {
        let mut platform = MockMaskPlatform::new();
        platform
            .expect_swap()
            .returning(|_, _| Ok(SigSet::empty()));
        platform
            .expect_install()
            .times(1)
            .returning(|_| Err(MaskError::Restore(Errno::EPERM)));

        let guard = SignalMaskGuard::install(&platform, MaskMode::Replace, &usr1()).unwrap();
        assert_eq!(
            guard.restore(),
            Err(GuardError::Mask(MaskError::Restore(Errno::EPERM)))
        );
    }

    #[test]
    fn test_release_twice() {
        let mut guard = SignalMaskGuard::install(&ThreadMask, MaskMode::Replace, &usr1()).unwrap();
        assert!(guard.release().is_ok());
        assert!(!guard.is_active());
        assert_eq!(guard.release(), Err(GuardError::AlreadyReleased));
    }

    #[test]
    fn test_drop_restores() {
        let before = SigSet::thread_get_mask().unwrap();
        {
            let _guard =
                SignalMaskGuard::install(&ThreadMask, MaskMode::Additive, &usr1()).unwrap();
            assert!(SigSet::thread_get_mask().unwrap().contains(Signal::SIGUSR1));
        }
        assert_eq!(SigSet::thread_get_mask().unwrap(), before);
    }

    #[test]
    fn test_swap_failure_has_nothing_to_restore() {
        let mut platform = MockMaskPlatform::new();
        platform
            .expect_swap()
            .times(1)
            .returning(|_, _| Err(MaskError::Swap(Errno::EINVAL)));
        platform.expect_install().never();

        let result = SignalMaskGuard::install(&platform, MaskMode::Additive, &usr1());
        assert_eq!(result.err(), Some(MaskError::Swap(Errno::EINVAL)));
    }

    #[test]
    fn test_restore_installs_saved_once() {
        let mut platform = MockMaskPlatform::new();
        platform
            .expect_swap()
            .times(1)
            .returning(|_, _| Ok(usr1()));
        platform
            .expect_install()
            .with(eq(usr1()))
            .times(1)
            .returning(|_| Ok(()));

        let guard = SignalMaskGuard::install(&platform, MaskMode::Replace, &SigSet::empty()).unwrap();
        assert_eq!(guard.mode(), MaskMode::Replace);
        guard.restore().unwrap();
    }

    #[test]
    fn test_failed_restore_is_not_retried() {
        let mut platform = MockMaskPlatform::new();
        platform
            .expect_swap()
            .returning(|_, _| Ok(SigSet::empty()));
        platform
            .expect_install()
            .times(1)
            .returning(|_| Err(MaskError::Restore(Errno::EFAULT)));

        let mut guard =
            SignalMaskGuard::install(&platform, MaskMode::Additive, &usr1()).unwrap();
        assert_eq!(
            guard.release(),
            Err(GuardError::Mask(MaskError::Restore(Errno::EFAULT)))
        );
        assert!(!guard.is_active());
        // Drop must not try again
    }
}
