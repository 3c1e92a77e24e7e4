//! Single-release transactor.
//!
//! Publishes one artifact to one track inside a remote edit:
//! open, resolve metadata, upload artifact, upload mapping, update track, commit.
//! An APK's manifest is read before the edit is opened so the edit belongs to
//! the package the artifact declares.
//! Once the edit exists, any later failure deletes it before the error is
//! returned, so no half-built edit is left blocking the package.

use crate::error::{Compensation, ConfigError, ReleaseError, TransactionError, TransactionStep};
use crate::metadata::{ArtifactMetadata, MetadataReader};
use crate::play::{EditHandle, PlayService, ReleaseDescriptor};
use crate::release::PublishRequest;

/// Result of a committed edit
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReceipt {
    /// Package the release was published for
    pub package_identifier: String,
    /// Committed edit id
    pub edit_id: String,
    /// Version code assigned to the uploaded artifact
    pub version_code: i64,
    /// Track the release was attached to
    pub track: String,
    /// Application name, as supplied or read from the artifact
    pub display_name: Option<String>,
    /// Release name
    pub version_label: Option<String>,
}

/// Name and version resolved during the metadata step
struct ResolvedMetadata {
    display_name: Option<String>,
    version_label: Option<String>,
}

type StepResult<T> = std::result::Result<T, (TransactionStep, ReleaseError)>;

fn at<E: Into<ReleaseError>>(step: TransactionStep) -> impl FnOnce(E) -> (TransactionStep, ReleaseError) {
    move |e| (step, e.into())
}

/// Drives one publish against a [`PlayService`]
pub struct Transactor<S, M> {
    service: S,
    metadata: M,
}

impl<S: PlayService, M: MetadataReader> Transactor<S, M> {
    /// Create a transactor over a service and a metadata reader
    pub fn new(service: S, metadata: M) -> Self {
        Self { service, metadata }
    }

    /// The underlying service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Publish one request.
    ///
    /// For APKs the manifest is read before the edit is opened, and the
    /// package it declares replaces the caller's: the service only accepts an
    /// upload whose package matches the edit exactly. The request is consumed;
    /// a failed request is never retried.
    pub async fn publish(
        &self,
        request: PublishRequest,
    ) -> std::result::Result<PublishReceipt, TransactionError> {
        let extracted = self.read_embedded_metadata(&request)?;
        let package = match &extracted {
            Some(metadata) => {
                if metadata.package_identifier != request.package_identifier {
                    log::warn!(
                        "Artifact declares package {}, using it instead of {}",
                        metadata.package_identifier,
                        request.package_identifier
                    );
                }
                metadata.package_identifier.clone()
            }
            None => request.package_identifier.clone(),
        };

        log::info!("{} for {}", TransactionStep::Open, package);
        let edit = self
            .service
            .open_edit(&package)
            .await
            .map_err(|e| {
                log::error!("Failed to open edit for {}: {}", package, e);
                TransactionError {
                    step: TransactionStep::Open,
                    package: package.clone(),
                    source: Box::new(e.into()),
                    compensation: Compensation::NotNeeded,
                }
            })?;
        log::info!("Created edit with id: {}", edit.id());

        match self.run_steps(&edit, request, extracted).await {
            Ok(receipt) => Ok(receipt),
            Err((step, cause)) => {
                log::error!("{} failed: {}", step, cause);
                let compensation = self.compensate(&edit).await;
                Err(TransactionError {
                    step,
                    package,
                    source: Box::new(cause),
                    compensation,
                })
            }
        }
    }

    /// Read the manifest of an APK; bundles carry nothing we can read
    fn read_embedded_metadata(
        &self,
        request: &PublishRequest,
    ) -> std::result::Result<Option<ArtifactMetadata>, TransactionError> {
        if !request.artifact_kind.has_embedded_metadata() {
            return Ok(None);
        }

        log::info!("{} {}", TransactionStep::ResolveMetadata, request.artifact_path.display());
        self.metadata
            .read_metadata(&request.artifact_path)
            .map(Some)
            .map_err(|e| {
                log::error!("{} failed: {}", TransactionStep::ResolveMetadata, e);
                TransactionError {
                    step: TransactionStep::ResolveMetadata,
                    package: request.package_identifier.clone(),
                    source: Box::new(e.into()),
                    compensation: Compensation::NotNeeded,
                }
            })
    }

    async fn run_steps(
        &self,
        edit: &EditHandle,
        request: PublishRequest,
        extracted: Option<ArtifactMetadata>,
    ) -> StepResult<PublishReceipt> {
        let resolved = resolve_metadata(&request, extracted);

        log::info!(
            "{} {} ({})",
            TransactionStep::UploadArtifact,
            request.artifact_path.display(),
            request.artifact_kind
        );
        let version_code = self
            .service
            .upload_artifact(edit, request.artifact_kind, &request.artifact_path)
            .await
            .map_err(at(TransactionStep::UploadArtifact))?;
        log::info!("Version code {} has been uploaded", version_code);

        match &request.symbols_file_path {
            Some(path) if path.is_file() => {
                log::info!("{} {}", TransactionStep::UploadSymbols, path.display());
                self.service
                    .upload_symbols(edit, version_code, path)
                    .await
                    .map_err(at(TransactionStep::UploadSymbols))?;
            }
            Some(path) => {
                log::warn!("Mapping file {} not found, skipping upload", path.display());
            }
            None => {}
        }

        request
            .validate_rollout()
            .map_err(|reason| ConfigError::InvalidField {
                field: "userFraction".to_string(),
                reason,
            })
            .map_err(at(TransactionStep::UpdateTrack))?;

        let release = ReleaseDescriptor {
            name: resolved.version_label.clone(),
            status: request.release_status,
            version_codes: vec![version_code],
            user_fraction: request.user_fraction,
            country_targeting: request.country_targeting,
            release_notes: request.release_notes,
        };
        log::info!(
            "{}: track={} status={} countries={}",
            TransactionStep::UpdateTrack,
            request.track,
            release.status,
            release
                .country_targeting
                .as_ref()
                .map(|t| t.countries.join(","))
                .unwrap_or_else(|| "all".to_string())
        );
        self.service
            .update_track(edit, &request.track, &release)
            .await
            .map_err(at(TransactionStep::UpdateTrack))?;
        log::info!("Track {} has been updated", request.track);

        log::info!("{}", TransactionStep::Commit);
        self.service
            .commit_edit(edit)
            .await
            .map_err(at(TransactionStep::Commit))?;
        log::info!("App edit with id {} has been committed", edit.id());

        Ok(PublishReceipt {
            package_identifier: edit.package().to_string(),
            edit_id: edit.id().to_string(),
            version_code,
            track: request.track,
            display_name: resolved.display_name,
            version_label: resolved.version_label,
        })
    }

    async fn compensate(&self, edit: &EditHandle) -> Compensation {
        log::info!("Deleting edit {}", edit.id());
        match self.service.delete_edit(edit).await {
            Ok(()) => {
                log::info!("Edit {} deleted", edit.id());
                Compensation::EditDeleted
            }
            Err(e) => {
                log::error!("Failed to delete edit {}: {}", edit.id(), e);
                Compensation::DeleteFailed(e.to_string())
            }
        }
    }
}

/// Caller-supplied name and version win over what the artifact declares
fn resolve_metadata(request: &PublishRequest, extracted: Option<ArtifactMetadata>) -> ResolvedMetadata {
    match extracted {
        Some(metadata) => ResolvedMetadata {
            display_name: request.display_name.clone().or(metadata.display_name),
            version_label: request.version_label.clone().or(metadata.version_label),
        },
        None => {
            if request.version_label.is_none() {
                log::warn!("No version name given for bundle; the release will be named by the service");
            }
            ResolvedMetadata {
                display_name: request.display_name.clone(),
                version_label: request.version_label.clone(),
            }
        }
    }
}
