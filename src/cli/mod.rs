//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Modes
//!
//! - `--about` - print tap metadata
//! - `--discover` - print the catalog
//! - default - sync streams, writing Singer messages to stdout

mod commands;
mod runner;

pub use commands::{Cli, Mode};
pub use runner::Runner;
