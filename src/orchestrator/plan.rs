//! Per-flavor resolution: templates, paths and overrides.
//!
//! Everything here is local and synchronous. Flavor entries in the
//! `*ByFlavor` maps always win over the global value, even when they are empty.

use crate::config::{Configuration, NotesWithoutLocales};
use crate::error::ConfigError;
use crate::release::{CountryTargeting, PublishRequest, ReleaseNote, load_release_notes, retain_locales};
use std::fmt;
use std::path::{Path, PathBuf};

use super::template::{render_package_name, render_template};

/// Why a flavor was not published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Rendered artifact path does not name a file
    ArtifactMissing(PathBuf),
    /// Confirmation was declined
    Declined,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ArtifactMissing(path) => write!(f, "file {} not found", path.display()),
            SkipReason::Declined => f.write_str("declined"),
        }
    }
}

/// Resolved work for one flavor
#[derive(Debug, Clone)]
pub enum FlavorPlan {
    /// Request ready to publish
    Ready {
        /// Flavor id
        flavor: String,
        /// Fully resolved request
        request: PublishRequest,
    },
    /// Nothing to publish
    Skipped {
        /// Flavor id
        flavor: String,
        /// Why
        reason: SkipReason,
    },
}

impl FlavorPlan {
    /// Flavor id
    pub fn flavor(&self) -> &str {
        match self {
            FlavorPlan::Ready { flavor, .. } | FlavorPlan::Skipped { flavor, .. } => flavor,
        }
    }
}

/// Resolve a rendered file name against the base folder
pub fn resolve_path(config: &Configuration, rendered: &str) -> PathBuf {
    normalize(&config.base_folder().join(rendered))
}

/// Lexically drop `.` and fold `..` components
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Effective country targeting for a flavor
pub fn resolve_countries(config: &Configuration, flavor: &str) -> Option<CountryTargeting> {
    let countries = config
        .countries_by_flavor
        .get(flavor)
        .unwrap_or(&config.countries);
    let targeting = CountryTargeting::from_countries(countries);
    if let Some(t) = &targeting {
        log::info!("Effective country list for {}: [{}]", flavor, t.countries.join(", "));
    }
    targeting
}

/// Effective locale filter for a flavor, `None` when nothing is configured
pub fn resolve_locales<'a>(config: &'a Configuration, flavor: &str) -> Option<&'a [String]> {
    config
        .locales_by_flavor
        .get(flavor)
        .or(config.default_locales.as_ref())
        .map(Vec::as_slice)
}

/// Effective release notes for a flavor.
///
/// A configured source that cannot be read is a configuration error.
pub fn resolve_release_notes(
    config: &Configuration,
    flavor: &str,
) -> Result<Vec<ReleaseNote>, ConfigError> {
    let source = config
        .release_notes_by_flavor
        .get(flavor)
        .or(config.release_notes_source.as_ref())
        .filter(|p| !p.as_os_str().is_empty());

    let Some(source) = source else {
        return Ok(Vec::new());
    };

    let path = normalize(&config.base_folder().join(source));
    let notes = load_release_notes(&path)?;

    let notes = match resolve_locales(config, flavor) {
        Some(locales) => retain_locales(notes, locales),
        None => match config.notes_without_locales {
            NotesWithoutLocales::KeepAll => notes,
            NotesWithoutLocales::KeepNone => Vec::new(),
        },
    };

    log::info!(
        "Release notes for {}: [{}]",
        flavor,
        notes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    );
    Ok(notes)
}

/// Resolve one flavor into a publish request, or a skip
pub fn plan_flavor(config: &Configuration, flavor: &str) -> Result<FlavorPlan, ConfigError> {
    log::info!("Checking configured flavor: [{}]", flavor);
    let file_type = config.artifact_kind.canonical_name();
    let render = |pattern: &str| render_template(pattern, flavor, &config.version, file_type);

    let artifact_path = resolve_path(config, &render(&config.artifact_file_pattern));
    if !artifact_path.is_file() {
        log::warn!(
            "{} file [{}] not found, skipping...",
            config.artifact_kind,
            artifact_path.display()
        );
        return Ok(FlavorPlan::Skipped {
            flavor: flavor.to_string(),
            reason: SkipReason::ArtifactMissing(artifact_path),
        });
    }

    let symbols_file_path = config
        .symbols_file_pattern
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|pattern| resolve_path(config, &render(pattern)))
        .filter(|path| {
            let exists = path.is_file();
            if !exists {
                log::warn!("Mapping file [{}] not found, skipping...", path.display());
            }
            exists
        });

    let request = PublishRequest {
        package_identifier: render_package_name(&config.package_name_pattern, flavor),
        display_name: None,
        version_label: Some(config.version.clone()).filter(|v| !v.is_empty()),
        artifact_path,
        symbols_file_path,
        country_targeting: resolve_countries(config, flavor),
        release_notes: resolve_release_notes(config, flavor)?,
        track: config.track.clone(),
        release_status: config.release_status,
        user_fraction: config.user_fraction,
        artifact_kind: config.artifact_kind,
    };

    Ok(FlavorPlan::Ready {
        flavor: flavor.to_string(),
        request,
    })
}

/// Text shown before publishing a flavor
pub fn confirmation_prompt(request: &PublishRequest) -> String {
    let mapping = request
        .symbols_file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let countries = request
        .country_targeting
        .as_ref()
        .map(|t| format!("[{}]", t.countries.join(", ")))
        .unwrap_or_default();
    let notes = request
        .release_notes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Publish {}\nMapping: {}\nCountries: {}\nRelease notes: [{}]\n\n(Y/N)?",
        request.artifact_path.display(),
        mapping,
        countries,
        notes
    )
}
