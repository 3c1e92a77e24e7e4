//! Publishing one artifact given on the command line.

use crate::cli::{Args, RuntimeConfig};
use crate::error::{CliError, ReleaseError, Result};
use crate::metadata::{ApkMetadataReader, MetadataReader};
use crate::release::{ArtifactKind, CountryTargeting, PublishRequest};

use super::helpers::{connect, print_request, release_notes_from_args};

/// Execute a single-artifact publish
pub(super) async fn execute_single(
    args: &Args,
    config: &RuntimeConfig,
    kind: ArtifactKind,
) -> Result<i32> {
    let request = build_request(args, kind)?;

    if args.dry_run {
        config.section("Dry run");
        print_request(config, &request);
        config.success_println("Nothing was published");
        return Ok(0);
    }

    config.println(&format!(
        "🚀 Publishing {} to {}...",
        request.artifact_path.display(),
        request.track
    ));

    let transactor = connect(&args.key)?;
    let receipt = transactor.publish(request).await?;

    config.success_println(&format!(
        "Published {} version code {} to {}",
        receipt.package_identifier, receipt.version_code, receipt.track
    ));
    if let Some(label) = &receipt.version_label {
        config.indent(&format!("Release: {}", label));
    }
    Ok(0)
}

/// Resolve the request from arguments; nothing here talks to the network
fn build_request(args: &Args, kind: ArtifactKind) -> Result<PublishRequest> {
    if !args.file.is_file() {
        return Err(ReleaseError::Cli(CliError::InvalidArguments {
            reason: format!("{} does not exist or is not a file", args.file.display()),
        }));
    }

    let package_identifier = match (&args.package_name, kind) {
        (Some(package), _) if !package.trim().is_empty() => package.trim().to_string(),
        (_, ArtifactKind::Apk) => ApkMetadataReader.read_metadata(&args.file)?.package_identifier,
        (_, ArtifactKind::Aab) => {
            return Err(ReleaseError::Cli(CliError::MissingArgument {
                argument: "--package-name (required for .aab files)".to_string(),
            }));
        }
    };

    let request = PublishRequest {
        package_identifier,
        display_name: args.name.clone(),
        version_label: args.version_name.clone(),
        artifact_path: args.file.clone(),
        symbols_file_path: args.mapping_file.clone(),
        country_targeting: CountryTargeting::from_countries(&args.countries),
        release_notes: release_notes_from_args(args.notes.as_deref(), args.notes_file.as_deref())?,
        track: args.track.clone(),
        release_status: args.status,
        user_fraction: args.user_fraction,
        artifact_kind: kind,
    };

    request
        .validate_rollout()
        .map_err(|reason| ReleaseError::Cli(CliError::InvalidArguments { reason }))?;

    Ok(request)
}
