/*!
 * Executor Module
 * Bracketed execution under a temporary signal mask
 */

pub mod masked;
pub mod request;

pub use masked::{run_masked, run_masked_with, ExecResult, MaskedCall};
pub use request::{Computation, Invocation, Registry};
