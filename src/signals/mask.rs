/*!
 * Signal Mask Platform
 *
 * The OS capability the executor consumes: atomically install a mask while
 * reporting the previous one, and install a mask unconditionally. The
 * production implementation works on the calling thread only.
 */

use crate::core::errors::{MaskError, MaskResult};
use nix::libc;
use nix::sys::signal::{SigSet, SigmaskHow};

/// How a requested set combines with the mask already in effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskMode {
    /// New mask = current mask + requested set
    #[default]
    Additive,
    /// New mask = requested set
    Replace,
}

impl MaskMode {
    #[inline]
    pub fn from_replace(replace_mask: bool) -> Self {
        if replace_mask {
            MaskMode::Replace
        } else {
            MaskMode::Additive
        }
    }

    #[inline]
    fn how(self) -> SigmaskHow {
        match self {
            MaskMode::Additive => SigmaskHow::SIG_BLOCK,
            MaskMode::Replace => SigmaskHow::SIG_SETMASK,
        }
    }
}

/// Signal mask primitive of the platform
#[cfg_attr(test, mockall::automock)]
pub trait MaskPlatform: Send + Sync {
    /// Install `set` according to `mode` and return the mask in effect
    /// immediately before, as one atomic operation
    fn swap(&self, mode: MaskMode, set: &SigSet) -> MaskResult<SigSet>;

    /// Install `mask` as the complete mask
    fn install(&self, mask: &SigSet) -> MaskResult<()>;

    /// Mask currently in effect
    fn current(&self) -> MaskResult<SigSet>;
}

/// `pthread_sigmask` on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadMask;

impl MaskPlatform for ThreadMask {
    fn swap(&self, mode: MaskMode, set: &SigSet) -> MaskResult<SigSet> {
        set.thread_swap_mask(mode.how()).map_err(MaskError::Swap)
    }

    fn install(&self, mask: &SigSet) -> MaskResult<()> {
        mask.thread_set_mask().map_err(MaskError::Restore)
    }

    fn current(&self) -> MaskResult<SigSet> {
        SigSet::thread_get_mask().map_err(MaskError::Query)
    }
}

/// Mask of the calling thread
pub fn current_mask() -> MaskResult<SigSet> {
    ThreadMask.current()
}

/// Build a mask from raw signal numbers
///
/// Works for every number the platform accepts, realtime signals included.
/// Numbers outside the platform range are skipped.
pub fn mask_of<I>(numbers: I) -> SigSet
where
    I: IntoIterator<Item = i32>,
{
    let mut raw = *SigSet::empty().as_ref();
    for number in numbers {
        // SAFETY: `raw` is an initialized sigset_t; invalid numbers return EINVAL
        unsafe {
            libc::sigaddset(&mut raw, number);
        }
    }
    // SAFETY: `raw` started from an emptied set and was only grown by sigaddset
    unsafe { SigSet::from_sigset_t_unchecked(raw) }
}

/// Whether `mask` holds the raw signal `number`
#[inline]
pub fn mask_contains(mask: &SigSet, number: i32) -> bool {
    // SAFETY: read-only query on an initialized sigset_t
    unsafe { libc::sigismember(mask.as_ref(), number) == 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::Signal;

    #[test]
    fn test_mode_from_replace() {
        assert_eq!(MaskMode::from_replace(false), MaskMode::Additive);
        assert_eq!(MaskMode::from_replace(true), MaskMode::Replace);
        assert_eq!(MaskMode::default(), MaskMode::Additive);
    }

    #[test]
    fn test_thread_mask_swap_and_install() {
        let platform = ThreadMask;
        let before = platform.current().unwrap();

        let mut set = SigSet::empty();
        set.add(Signal::SIGUSR1);
        let saved = platform.swap(MaskMode::Additive, &set).unwrap();
        assert_eq!(saved, before);
        assert!(platform.current().unwrap().contains(Signal::SIGUSR1));

        platform.install(&saved).unwrap();
        assert_eq!(platform.current().unwrap(), before);
    }

    #[test]
    fn test_thread_mask_replace() {
        let platform = ThreadMask;
        let before = platform.current().unwrap();

        let mut outer = SigSet::empty();
        outer.add(Signal::SIGUSR2);
        let saved = platform.swap(MaskMode::Additive, &outer).unwrap();

        let inner = SigSet::empty();
        let saved_inner = platform.swap(MaskMode::Replace, &inner).unwrap();
        assert!(saved_inner.contains(Signal::SIGUSR2));
        assert!(!platform.current().unwrap().contains(Signal::SIGUSR2));

        platform.install(&saved_inner).unwrap();
        platform.install(&saved).unwrap();
        assert_eq!(platform.current().unwrap(), before);
    }

    #[test]
    fn test_mask_of_raw_numbers() {
        let mask = mask_of([Signal::SIGINT as i32, Signal::SIGHUP as i32, 0, -4, 4096]);
        assert!(mask.contains(Signal::SIGINT));
        assert!(mask.contains(Signal::SIGHUP));
        assert!(!mask.contains(Signal::SIGTERM));
        assert!(mask_contains(&mask, Signal::SIGINT as i32));
        assert!(!mask_contains(&mask, 4096));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_mask_of_realtime() {
        let rtmin = libc::SIGRTMIN();
        let mask = mask_of([rtmin]);
        assert!(mask_contains(&mask, rtmin));
        assert!(!mask_contains(&mask, rtmin + 1));
        assert!(!mask_contains(&SigSet::empty(), rtmin));
    }
}
