//! sable: semantic-analysis driver and its command-line front end.
//!
//! The checking machinery lives in the workspace crates; this crate wires
//! them to a JSON unit manifest and a terminal reporter.

pub use sable_ast as ast;
pub use sable_checker as checker;
pub use sable_common as common;

// Tracing configuration (text / tree / JSON output for debugging)
pub mod tracing_config;

// Native CLI
pub mod cli;
