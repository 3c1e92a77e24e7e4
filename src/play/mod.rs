//! Remote distribution service (Google Play) integration.
//!
//! [`PlayService`] is the narrow interface the transactor drives. [`PlayClient`]
//! implements it against the Android Publisher REST API; tests substitute their
//! own implementation.

mod auth;
mod client;

pub use auth::{AccessTokenProvider, ServiceAccountKey};
pub use client::PlayClient;

use crate::error::ServiceError;
use crate::release::{ArtifactKind, CountryTargeting, ReleaseNote, ReleaseStatus};
use std::future::Future;
use std::path::Path;

/// Result type for remote service calls
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Operations the transactor needs from the distribution service.
///
/// Every call is a single blocking request/response; nothing is retried.
pub trait PlayService {
    /// Create an edit for the package
    fn open_edit(&self, package: &str) -> impl Future<Output = ServiceResult<EditHandle>>;

    /// Upload the artifact into the edit, returning its service-assigned version code
    fn upload_artifact(
        &self,
        edit: &EditHandle,
        kind: ArtifactKind,
        file: &Path,
    ) -> impl Future<Output = ServiceResult<i64>>;

    /// Upload a deobfuscation file for an uploaded version code
    fn upload_symbols(
        &self,
        edit: &EditHandle,
        version_code: i64,
        file: &Path,
    ) -> impl Future<Output = ServiceResult<()>>;

    /// Replace the track's releases with `release`
    fn update_track(
        &self,
        edit: &EditHandle,
        track: &str,
        release: &ReleaseDescriptor,
    ) -> impl Future<Output = ServiceResult<()>>;

    /// Commit the edit
    fn commit_edit(&self, edit: &EditHandle) -> impl Future<Output = ServiceResult<()>>;

    /// Delete the edit (compensation only)
    fn delete_edit(&self, edit: &EditHandle) -> impl Future<Output = ServiceResult<()>>;
}

/// Service-issued handle of an in-flight edit.
///
/// Lives only inside one transaction and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHandle {
    package: String,
    id: String,
}

impl EditHandle {
    /// Wrap an edit id returned by the service
    pub fn new(package: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            id: id.into(),
        }
    }

    /// Package the edit belongs to
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Edit id
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// One release attached to a track
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseDescriptor {
    /// Release name (the version label); `None` lets the service name it
    pub name: Option<String>,
    /// Release status
    pub status: ReleaseStatus,
    /// Version codes in the release
    pub version_codes: Vec<i64>,
    /// Rollout fraction for staged releases
    pub user_fraction: Option<f64>,
    /// Country restriction
    pub country_targeting: Option<CountryTargeting>,
    /// Localized release notes
    pub release_notes: Vec<ReleaseNote>,
}
