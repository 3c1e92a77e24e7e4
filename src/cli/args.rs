//! Command line argument parsing and validation.

use crate::release::ReleaseStatus;
use clap::Parser;
use std::path::PathBuf;

/// Publish APK/AAB artifacts to Google Play
#[derive(Parser, Debug, Clone)]
#[command(
    name = "playstore_release",
    version,
    about = "Publish APK/AAB artifacts to Google Play",
    long_about = "Publish Android artifacts to a Google Play track inside one edit.

A .apk or .aab --file is published on its own. A .json or .toml --file is a batch
configuration and publishes every flavor it lists.

Usage:
  playstore_release --key key.json --file app-release.apk --track beta
  playstore_release --key key.json --file app.aab --package-name com.example.app
  playstore_release --key key.json --file release.json --dry-run"
)]
pub struct Args {
    /// Service-account JSON key file
    #[arg(short = 'k', long, value_name = "FILE")]
    pub key: PathBuf,

    /// Artifact (.apk, .aab) or batch configuration (.json, .toml)
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: PathBuf,

    /// Application display name
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Package name; read from the artifact for APKs when omitted
    #[arg(short = 'p', long = "package-name")]
    pub package_name: Option<String>,

    /// Release track
    #[arg(short = 't', long, default_value = "alpha")]
    pub track: String,

    /// Release notes text (en-US)
    #[arg(long, conflicts_with = "notes_file")]
    pub notes: Option<String>,

    /// Release notes file: plain text, or a .json list of {language, text}
    #[arg(long = "notes-file", value_name = "FILE")]
    pub notes_file: Option<PathBuf>,

    /// Deobfuscation mapping file
    #[arg(short = 'm', long = "mapping-file", visible_alias = "symbols-file", value_name = "FILE")]
    pub mapping_file: Option<PathBuf>,

    /// Comma-separated country codes the release is restricted to
    #[arg(short = 'c', long, value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Release name; read from the artifact for APKs when omitted
    #[arg(long = "version-name")]
    pub version_name: Option<String>,

    /// Release status: draft, inProgress, halted or completed
    #[arg(long, default_value = "completed")]
    pub status: ReleaseStatus,

    /// Rollout fraction for inProgress/halted releases
    #[arg(long = "user-fraction")]
    pub user_fraction: Option<f64>,

    /// Resolve and print what would be published without contacting Google Play
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.file.as_os_str().is_empty() {
            return Err("--file must not be empty".to_string());
        }

        if self.track.trim().is_empty() {
            return Err("--track must not be empty".to_string());
        }

        if let Some(fraction) = self.user_fraction
            && !(fraction > 0.0 && fraction < 1.0)
        {
            return Err(format!(
                "--user-fraction must be between 0 and 1 (exclusive), got {}",
                fraction
            ));
        }

        Ok(())
    }
}

/// Runtime state shared by the commands
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new() -> Self {
        Self {
            output: super::OutputManager::new(false),
        }
    }

    /// Print info message
    pub fn info_println(&self, message: &str) {
        self.output.info(message);
    }

    /// Print message
    pub fn println(&self, message: &str) {
        self.output.println(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        self.output.success(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        self.output.warn(message);
    }

    /// Print error message
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        self.output.section(title);
    }

    /// Print indented message
    pub fn indent(&self, message: &str) {
        self.output.indent(message);
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}
