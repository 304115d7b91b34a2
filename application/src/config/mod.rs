//! Application-level configuration.
//!
//! - [`ExecutionParams`]: chain loop control (retry bound, stall detection,
//!   judge exemptions)

pub mod execution_params;

pub use execution_params::ExecutionParams;
