//! Shared helper functions for command execution.

use crate::cli::RuntimeConfig;
use crate::error::{ConfigError, Result};
use crate::metadata::ApkMetadataReader;
use crate::play::{PlayClient, ServiceAccountKey};
use crate::release::{PublishRequest, ReleaseNote, load_release_notes, notes_from_text};
use crate::transaction::Transactor;
use std::path::Path;

/// Name sent in the user agent of every API call
pub(super) const APPLICATION_NAME: &str = "playstore-release";

/// Release notes from `--notes` or `--notes-file`
pub(super) fn release_notes_from_args(
    notes: Option<&str>,
    notes_file: Option<&Path>,
) -> std::result::Result<Vec<ReleaseNote>, ConfigError> {
    match (notes, notes_file) {
        (Some(text), _) if !text.trim().is_empty() => Ok(notes_from_text(text)),
        (_, Some(path)) => load_release_notes(path),
        _ => Ok(Vec::new()),
    }
}

/// Load credentials and build a transactor against Google Play
pub(super) fn connect(key_path: &Path) -> Result<Transactor<PlayClient, ApkMetadataReader>> {
    let key = ServiceAccountKey::from_file(key_path)?;
    let client = PlayClient::new(key, APPLICATION_NAME)?;
    Ok(Transactor::new(client, ApkMetadataReader))
}

/// Print a resolved request
pub(super) fn print_request(config: &RuntimeConfig, request: &PublishRequest) {
    config.indent(&format!("package:   {}", request.package_identifier));
    config.indent(&format!(
        "artifact:  {} ({})",
        request.artifact_path.display(),
        request.artifact_kind
    ));
    if let Some(path) = &request.symbols_file_path {
        config.indent(&format!("mapping:   {}", path.display()));
    }
    config.indent(&format!("track:     {} ({})", request.track, request.release_status));
    if let Some(fraction) = request.user_fraction {
        config.indent(&format!("rollout:   {}", fraction));
    }
    if let Some(label) = &request.version_label {
        config.indent(&format!("release:   {}", label));
    }
    match &request.country_targeting {
        Some(targeting) => config.indent(&format!("countries: {}", targeting.countries.join(", "))),
        None => config.indent("countries: all"),
    }
    for note in &request.release_notes {
        config.indent(&format!("notes:     {}", note));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_notes_win() {
        let notes = release_notes_from_args(Some("Fixes"), None).unwrap();
        assert_eq!(notes, vec![ReleaseNote::new("en-US", "Fixes")]);
    }

    #[test]
    fn test_no_notes() {
        assert!(release_notes_from_args(None, None).unwrap().is_empty());
        assert!(release_notes_from_args(Some("  "), None).unwrap().is_empty());
    }

    #[test]
    fn test_notes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "From file").unwrap();
        let notes = release_notes_from_args(None, Some(&path)).unwrap();
        assert_eq!(notes[0].text, "From file");
    }
}
