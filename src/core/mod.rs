/*!
 * Core Module
 * Errors, options and guards shared by the rest of the crate
 */

pub mod config;
pub mod errors;
pub mod guard;

pub use config::MaskOptions;
pub use errors::{ExecError, MaskError, MaskResult, PreconditionError};
