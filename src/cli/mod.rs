//! CLI module for the resync tool.
//!
//! This module provides the command-line surface and output rendering.

mod commands;
mod output;

pub use commands::{Cli, OutputFormat};
pub use output::OutputFormatter;
