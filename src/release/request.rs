//! Fully-resolved publish request and its enumerated fields.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::ReleaseNote;

/// MIME type of an APK upload
const MIME_TYPE_APK: &str = "application/vnd.android.package-archive";
/// MIME type of an AAB upload
const MIME_TYPE_AAB: &str = "application/octet-stream";

/// Kind of artifact being published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Single installable binary (APK); metadata is read from the artifact
    #[default]
    Apk,
    /// Bundle archive (AAB); metadata must be supplied by the caller
    Aab,
}

impl ArtifactKind {
    /// Canonical lowercase name, used for the `{fileType}` placeholder
    pub fn canonical_name(self) -> &'static str {
        match self {
            ArtifactKind::Apk => "apk",
            ArtifactKind::Aab => "aab",
        }
    }

    /// Content type the artifact is uploaded with
    pub fn mime_type(self) -> &'static str {
        match self {
            ArtifactKind::Apk => MIME_TYPE_APK,
            ArtifactKind::Aab => MIME_TYPE_AAB,
        }
    }

    /// Whether package id, label and version can be read from the artifact itself
    pub fn has_embedded_metadata(self) -> bool {
        matches!(self, ArtifactKind::Apk)
    }

    /// Parse a kind name case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "apk" => Some(ArtifactKind::Apk),
            "aab" => Some(ArtifactKind::Aab),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_name().to_ascii_uppercase())
    }
}

impl<'de> Deserialize<'de> for ArtifactKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ArtifactKind::parse(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown artifact kind '{value}', expected apk or aab"))
        })
    }
}

/// Status of the release on its track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReleaseStatus {
    /// Not yet visible to users
    Draft,
    /// Staged rollout in progress
    InProgress,
    /// Staged rollout halted
    Halted,
    /// Rolled out to everyone on the track
    #[default]
    Completed,
}

impl ReleaseStatus {
    /// Wire name used by the service
    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseStatus::Draft => "draft",
            ReleaseStatus::InProgress => "inProgress",
            ReleaseStatus::Halted => "halted",
            ReleaseStatus::Completed => "completed",
        }
    }

    /// Whether a rollout fraction applies to this status
    pub fn is_staged(self) -> bool {
        matches!(self, ReleaseStatus::InProgress | ReleaseStatus::Halted)
    }

    /// Whether the service rejects this status without a rollout fraction.
    ///
    /// A halted release may stop a full rollout, so only `inProgress` needs one.
    pub fn requires_fraction(self) -> bool {
        self == ReleaseStatus::InProgress
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReleaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ReleaseStatus::Draft),
            "inProgress" | "in-progress" | "in_progress" => Ok(ReleaseStatus::InProgress),
            "halted" => Ok(ReleaseStatus::Halted),
            "completed" => Ok(ReleaseStatus::Completed),
            other => Err(format!(
                "unknown release status '{other}', expected draft, inProgress, halted or completed"
            )),
        }
    }
}

/// Restriction of a release to a set of countries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryTargeting {
    /// Two-letter country codes
    pub countries: Vec<String>,
    /// Whether the release is also visible outside the listed countries
    pub include_rest_of_world: bool,
}

impl CountryTargeting {
    /// Build targeting for the given countries.
    ///
    /// An empty list yields `None`: the release is published without restriction
    /// rather than to zero countries.
    pub fn from_countries<I, S>(countries: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let countries: Vec<String> = countries
            .into_iter()
            .map(|c| c.as_ref().trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect();

        if countries.is_empty() {
            None
        } else {
            Some(Self {
                countries,
                include_rest_of_world: false,
            })
        }
    }
}

/// Everything needed to publish one artifact to one track
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Application id on the service (the edit is opened for it)
    pub package_identifier: String,
    /// Display name; filled from the artifact when absent
    pub display_name: Option<String>,
    /// Release name; filled from the artifact's version name when absent
    pub version_label: Option<String>,
    /// Resolved artifact location
    pub artifact_path: PathBuf,
    /// Resolved deobfuscation file, if any
    pub symbols_file_path: Option<PathBuf>,
    /// Country restriction; `None` publishes everywhere
    pub country_targeting: Option<CountryTargeting>,
    /// Localized notes, unique per language
    pub release_notes: Vec<ReleaseNote>,
    /// Track name, passed through unvalidated
    pub track: String,
    /// Release status on the track
    pub release_status: ReleaseStatus,
    /// Rollout fraction for staged statuses
    pub user_fraction: Option<f64>,
    /// APK or AAB
    pub artifact_kind: ArtifactKind,
}

impl PublishRequest {
    /// Check the status/fraction combination the service accepts
    pub fn validate_rollout(&self) -> Result<(), String> {
        let status = self.release_status;
        match self.user_fraction {
            None if status.requires_fraction() => {
                Err(format!("status '{status}' requires a user fraction"))
            }
            Some(_) if !status.is_staged() => Err(format!(
                "a user fraction only applies to inProgress or halted releases, not '{status}'"
            )),
            Some(fraction) if !(fraction > 0.0 && fraction < 1.0) => Err(format!(
                "user fraction must be between 0 and 1 (exclusive), got {fraction}"
            )),
            _ => Ok(()),
        }
    }
}
