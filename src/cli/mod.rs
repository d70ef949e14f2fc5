//! CLI argument parsing and command dispatch.

pub mod args;
pub mod probe;
pub mod providers;

pub use args::{Cli, Commands, OutputFormat};
