//! Command line interface for playstore_release.
//!
//! A thin layer over the library: parses arguments, dispatches on the input
//! file type and reports results.

mod args;
pub mod commands;
mod output;

pub use args::{Args, RuntimeConfig};
pub use commands::{InputKind, classify_input, execute_command};
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
