//! Command execution: dispatch on the type of `--file`.

mod batch;
mod helpers;
mod single;

use crate::cli::{Args, RuntimeConfig};
use crate::error::{CliError, ReleaseError, Result};
use crate::release::ArtifactKind;
use std::path::Path;

use batch::execute_batch;
use single::execute_single;

/// What `--file` names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A single artifact
    Artifact(ArtifactKind),
    /// A batch configuration
    Batch,
}

/// Classify `--file` by extension
pub fn classify_input(file: &Path) -> Result<InputKind> {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("json") | Some("toml") => Ok(InputKind::Batch),
        Some(other) => ArtifactKind::parse(other)
            .map(InputKind::Artifact)
            .ok_or_else(|| unsupported(file)),
        None => Err(unsupported(file)),
    }
}

fn unsupported(file: &Path) -> ReleaseError {
    ReleaseError::Cli(CliError::UnsupportedFile {
        file: file.display().to_string(),
    })
}

/// Execute the command described by the arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        return Err(ReleaseError::Cli(CliError::InvalidArguments {
            reason: validation_error,
        }));
    }

    let config = RuntimeConfig::new();

    match classify_input(&args.file)? {
        InputKind::Artifact(kind) => execute_single(&args, &config, kind).await,
        InputKind::Batch => execute_batch(&args, &config).await,
    }
}
