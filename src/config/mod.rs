//! Batch configuration: one immutable value loaded from JSON or TOML.
//!
//! Keys are camelCase. Every key has a default except `packageNamePattern` and
//! `flavors`. The names used by older configuration files (`apkFilePattern`,
//! `mappingFilePattern`, `releaseNotes`, `locales`, `fileType`, `status`) are
//! accepted as aliases.

use crate::error::ConfigError;
use crate::release::{ArtifactKind, ReleaseStatus};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// What to keep when neither the flavor nor the configuration names any locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum NotesWithoutLocales {
    /// Publish every note from the source file
    #[default]
    #[serde(rename = "all")]
    KeepAll,
    /// Publish no notes
    #[serde(rename = "none")]
    KeepNone,
}

/// Parsed batch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Track every flavor is released to
    #[serde(default = "default_track")]
    pub track: String,

    /// Flavors, processed in this order
    #[serde(default)]
    pub flavors: Vec<String>,

    /// Value of the `{version}` placeholder, also used as release name
    #[serde(default)]
    pub version: String,

    /// Artifact file-name template
    #[serde(default = "default_artifact_pattern", alias = "apkFilePattern")]
    pub artifact_file_pattern: String,

    /// APK or AAB
    #[serde(default, alias = "fileType")]
    pub artifact_kind: ArtifactKind,

    /// Package id template
    #[serde(default)]
    pub package_name_pattern: String,

    /// Deobfuscation file template
    #[serde(default, alias = "mappingFilePattern")]
    pub symbols_file_pattern: Option<String>,

    /// Root that templates resolve against
    #[serde(default)]
    pub base_folder: Option<PathBuf>,

    /// Countries for flavors without their own list
    #[serde(default)]
    pub countries: Vec<String>,

    /// Per-flavor country lists
    #[serde(default)]
    pub countries_by_flavor: HashMap<String, Vec<String>>,

    /// Release notes file for flavors without their own
    #[serde(default, alias = "releaseNotes")]
    pub release_notes_source: Option<PathBuf>,

    /// Per-flavor release notes files
    #[serde(default)]
    pub release_notes_by_flavor: HashMap<String, PathBuf>,

    /// Per-flavor locale filters
    #[serde(default, alias = "locales")]
    pub locales_by_flavor: HashMap<String, Vec<String>>,

    /// Locale filter for flavors without their own
    #[serde(default)]
    pub default_locales: Option<Vec<String>>,

    /// Policy when no locale filter resolves for a flavor
    #[serde(default)]
    pub notes_without_locales: NotesWithoutLocales,

    /// Skip interactive confirmation
    #[serde(default)]
    pub unattended: bool,

    /// Stop the batch at the first failed flavor
    #[serde(default)]
    pub abort_on_error: bool,

    /// Status of every release
    #[serde(default, alias = "status")]
    pub release_status: ReleaseStatus,

    /// Rollout fraction for staged releases
    #[serde(default)]
    pub user_fraction: Option<f64>,
}

fn default_track() -> String {
    "alpha".to_string()
}

fn default_artifact_pattern() -> String {
    "{flavor}-{version}.{fileType}".to_string()
}

impl Configuration {
    /// Load and validate a configuration file.
    ///
    /// The base folder is resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config: Configuration = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?,
            Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };

        let config_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        config.finish(config_dir)
    }

    /// Parse a JSON configuration as if it lived in `config_dir`
    pub fn from_json(content: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let config: Configuration =
            serde_json::from_str(content).map_err(|source| ConfigError::Json {
                path: config_dir.join("<inline>"),
                source,
            })?;
        config.finish(config_dir)
    }

    fn finish(mut self, config_dir: &Path) -> Result<Self, ConfigError> {
        self.base_folder = Some(match self.base_folder.take() {
            Some(folder) if !folder.as_os_str().is_empty() => config_dir.join(folder),
            _ => config_dir.to_path_buf(),
        });
        self.validate()?;
        Ok(self)
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flavors.is_empty() {
            return Err(ConfigError::MissingField {
                field: "flavors".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for flavor in &self.flavors {
            if flavor.trim().is_empty() {
                return Err(ConfigError::InvalidField {
                    field: "flavors".to_string(),
                    reason: "flavor ids must not be empty".to_string(),
                });
            }
            if !seen.insert(flavor.as_str()) {
                return Err(ConfigError::DuplicateFlavor {
                    flavor: flavor.clone(),
                });
            }
        }

        if self.track.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "track".to_string(),
            });
        }

        if self.package_name_pattern.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "packageNamePattern".to_string(),
            });
        }

        if self.artifact_file_pattern.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "artifactFilePattern".to_string(),
            });
        }

        match self.user_fraction {
            None if self.release_status.requires_fraction() => {
                return Err(ConfigError::MissingField {
                    field: "userFraction".to_string(),
                });
            }
            Some(_) if !self.release_status.is_staged() => {
                return Err(ConfigError::InvalidField {
                    field: "userFraction".to_string(),
                    reason: format!(
                        "only applies to inProgress or halted releases, not '{}'",
                        self.release_status
                    ),
                });
            }
            Some(f) if !(f > 0.0 && f < 1.0) => {
                return Err(ConfigError::InvalidField {
                    field: "userFraction".to_string(),
                    reason: format!("{f} is not between 0 and 1 (exclusive)"),
                });
            }
            _ => {}
        }

        Ok(())
    }

    /// Folder that templates and notes paths resolve against
    pub fn base_folder(&self) -> &Path {
        self.base_folder.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// Human-readable summary for logs and the dry-run report
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("track: {}", self.track),
            format!("flavors: [{}]", self.flavors.join(", ")),
            format!("version: {}", self.version),
            format!("artifact pattern: {} ({})", self.artifact_file_pattern, self.artifact_kind),
            format!("package pattern: {}", self.package_name_pattern),
            format!("base folder: {}", self.base_folder().display()),
            format!("status: {}", self.release_status),
        ];
        if let Some(pattern) = &self.symbols_file_pattern {
            lines.push(format!("mapping pattern: {}", pattern));
        }
        if !self.countries.is_empty() {
            lines.push(format!("countries: [{}]", self.countries.join(", ")));
        }
        lines.push(format!(
            "unattended: {}, abortOnError: {}",
            self.unattended, self.abort_on_error
        ));
        lines
    }
}
