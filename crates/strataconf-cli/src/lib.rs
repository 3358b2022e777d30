//! strataconf CLI library
//!
//! Exposes the CLI entry point so other binaries can bundle it.

mod cli;

pub use cli::run;
