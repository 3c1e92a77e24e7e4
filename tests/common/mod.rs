//! In-memory Play service and metadata stubs shared by the integration tests.

#![allow(dead_code)]

use playstore_release::error::{MetadataError, ServiceError};
use playstore_release::metadata::{ArtifactMetadata, MetadataReader};
use playstore_release::play::{EditHandle, PlayService, ReleaseDescriptor, ServiceResult};
use playstore_release::release::{ArtifactKind, PublishRequest, ReleaseStatus};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Service operation, used to inject failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Open,
    UploadArtifact,
    UploadSymbols,
    UpdateTrack,
    Commit,
    Delete,
}

/// One recorded service call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open(String),
    UploadArtifact { edit: String, kind: ArtifactKind, file: PathBuf },
    UploadSymbols { edit: String, version_code: i64 },
    UpdateTrack { edit: String, track: String, release: ReleaseDescriptor },
    Commit(String),
    Delete(String),
}

impl Call {
    pub fn op(&self) -> Op {
        match self {
            Call::Open(_) => Op::Open,
            Call::UploadArtifact { .. } => Op::UploadArtifact,
            Call::UploadSymbols { .. } => Op::UploadSymbols,
            Call::UpdateTrack { .. } => Op::UpdateTrack,
            Call::Commit(_) => Op::Commit,
            Call::Delete(_) => Op::Delete,
        }
    }
}

/// Records every call and fails the configured operations
#[derive(Default)]
pub struct RecordingService {
    calls: Mutex<Vec<Call>>,
    failures: Vec<(Op, Option<String>)>,
    edits: Mutex<u32>,
}

impl RecordingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `op` for every package
    pub fn failing(mut self, op: Op) -> Self {
        self.failures.push((op, None));
        self
    }

    /// Fail `op` only for edits of `package`
    pub fn failing_for(mut self, op: Op, package: &str) -> Self {
        self.failures.push((op, Some(package.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.calls().iter().map(Call::op).collect()
    }

    /// Packages an edit was opened for, in order
    pub fn opened_packages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Open(package) => Some(package),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_edits(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(edit) => Some(edit),
                _ => None,
            })
            .collect()
    }

    pub fn track_updates(&self) -> Vec<ReleaseDescriptor> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::UpdateTrack { release, .. } => Some(release),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call, package: &str) -> ServiceResult<()> {
        let op = call.op();
        self.calls.lock().unwrap().push(call);
        let fails = self
            .failures
            .iter()
            .any(|(failing, only)| *failing == op && only.as_deref().is_none_or(|p| p == package));
        if fails {
            Err(ServiceError::Status {
                operation: format!("{op:?}"),
                status: 500,
                message: format!("injected {op:?} failure"),
            })
        } else {
            Ok(())
        }
    }
}

impl PlayService for RecordingService {
    async fn open_edit(&self, package: &str) -> ServiceResult<EditHandle> {
        self.record(Call::Open(package.to_string()), package)?;
        let mut counter = self.edits.lock().unwrap();
        *counter += 1;
        Ok(EditHandle::new(package, format!("edit-{}", *counter)))
    }

    async fn upload_artifact(
        &self,
        edit: &EditHandle,
        kind: ArtifactKind,
        file: &Path,
    ) -> ServiceResult<i64> {
        self.record(
            Call::UploadArtifact {
                edit: edit.id().to_string(),
                kind,
                file: file.to_path_buf(),
            },
            edit.package(),
        )?;
        Ok(100 + i64::from(*self.edits.lock().unwrap()))
    }

    async fn upload_symbols(
        &self,
        edit: &EditHandle,
        version_code: i64,
        _file: &Path,
    ) -> ServiceResult<()> {
        self.record(
            Call::UploadSymbols {
                edit: edit.id().to_string(),
                version_code,
            },
            edit.package(),
        )
    }

    async fn update_track(
        &self,
        edit: &EditHandle,
        track: &str,
        release: &ReleaseDescriptor,
    ) -> ServiceResult<()> {
        self.record(
            Call::UpdateTrack {
                edit: edit.id().to_string(),
                track: track.to_string(),
                release: release.clone(),
            },
            edit.package(),
        )
    }

    async fn commit_edit(&self, edit: &EditHandle) -> ServiceResult<()> {
        self.record(Call::Commit(edit.id().to_string()), edit.package())
    }

    async fn delete_edit(&self, edit: &EditHandle) -> ServiceResult<()> {
        self.record(Call::Delete(edit.id().to_string()), edit.package())
    }
}

/// Metadata reader returning fixed values, or failing
pub struct StubReader {
    metadata: Option<ArtifactMetadata>,
    reads: Mutex<Vec<PathBuf>>,
}

impl StubReader {
    pub fn returning(package: &str, version_code: i64, version_name: &str) -> Self {
        Self {
            metadata: Some(ArtifactMetadata {
                package_identifier: package.to_string(),
                display_name: Some("Example".to_string()),
                version_code,
                version_label: Some(version_name.to_string()),
            }),
            reads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            metadata: None,
            reads: Mutex::new(Vec::new()),
        }
    }

    pub fn reads(&self) -> Vec<PathBuf> {
        self.reads.lock().unwrap().clone()
    }
}

impl MetadataReader for StubReader {
    fn read_metadata(&self, path: &Path) -> Result<ArtifactMetadata, MetadataError> {
        self.reads.lock().unwrap().push(path.to_path_buf());
        self.metadata
            .clone()
            .ok_or_else(|| MetadataError::Malformed("stub manifest is unreadable".to_string()))
    }
}

/// Minimal APK request for `package`
pub fn request(package: &str, artifact: &Path) -> PublishRequest {
    PublishRequest {
        package_identifier: package.to_string(),
        display_name: None,
        version_label: None,
        artifact_path: artifact.to_path_buf(),
        symbols_file_path: None,
        country_targeting: None,
        release_notes: Vec::new(),
        track: "beta".to_string(),
        release_status: ReleaseStatus::Completed,
        user_fraction: None,
        artifact_kind: ArtifactKind::Apk,
    }
}
