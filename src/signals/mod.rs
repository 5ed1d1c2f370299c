/*!
 * Signals Module
 * Signal names and the thread signal mask primitive
 */

pub mod mask;
pub mod names;

pub use mask::{current_mask, mask_contains, mask_of, MaskMode, MaskPlatform, ThreadMask};
pub use names::{known_names, resolve, signal_name, signal_number, SignalSet, SignalTable};
