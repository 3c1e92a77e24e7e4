//! Google Play Android Publisher v3 client.

use crate::error::ServiceError;
use crate::release::ArtifactKind;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::io::ReaderStream;

use super::auth::{AccessTokenProvider, ServiceAccountKey};
use super::{EditHandle, PlayService, ReleaseDescriptor, ServiceResult};

/// REST root of the publisher API
const API_BASE: &str = "https://androidpublisher.googleapis.com/androidpublisher/v3";

/// Media-upload root of the publisher API
const UPLOAD_BASE: &str = "https://androidpublisher.googleapis.com/upload/androidpublisher/v3";

/// Deobfuscation file type for R8/ProGuard mappings
const DEOBFUSCATION_TYPE: &str = "proguard";

/// Content type of mapping uploads
const MIME_TYPE_MAPPING: &str = "application/octet-stream";

/// Android Publisher API client
pub struct PlayClient {
    http: reqwest::Client,
    tokens: AccessTokenProvider,
    api_base: String,
    upload_base: String,
}

#[derive(Debug, Deserialize)]
struct AppEdit {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedBinary {
    version_code: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeobfuscationUpload {
    #[serde(default)]
    deobfuscation_file: Option<DeobfuscationFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeobfuscationFile {
    #[serde(default)]
    symbol_type: Option<String>,
}

#[derive(Debug, Serialize)]
struct Track<'a> {
    track: &'a str,
    releases: Vec<TrackRelease<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackRelease<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    status: &'static str,
    version_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_fraction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    country_targeting: Option<&'a crate::release::CountryTargeting>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    release_notes: &'a [crate::release::ReleaseNote],
}

impl<'a> Track<'a> {
    fn single(track: &'a str, release: &'a ReleaseDescriptor) -> Self {
        Self {
            track,
            releases: vec![TrackRelease {
                name: release.name.as_deref(),
                status: release.status.as_str(),
                version_codes: release.version_codes.iter().map(i64::to_string).collect(),
                user_fraction: release.user_fraction,
                country_targeting: release.country_targeting.as_ref(),
                release_notes: &release.release_notes,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl PlayClient {
    /// Create a client authenticated with a service-account key
    pub fn new(key: ServiceAccountKey, application_name: &str) -> Result<Self, ServiceError> {
        Self::with_endpoints(key, application_name, API_BASE, UPLOAD_BASE)
    }

    /// Create a client talking to custom endpoints (proxies, test servers)
    pub fn with_endpoints(
        key: ServiceAccountKey,
        application_name: &str,
        api_base: &str,
        upload_base: &str,
    ) -> Result<Self, ServiceError> {
        log::info!("Initialising publisher service...");
        let http = reqwest::Client::builder()
            .user_agent(format!(
                "{} {}/{}",
                application_name,
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| ServiceError::Request {
                operation: "client setup".to_string(),
                reason: e.to_string(),
            })?;
        let tokens = AccessTokenProvider::new(key, http.clone())?;

        Ok(Self {
            http,
            tokens,
            api_base: api_base.trim_end_matches('/').to_string(),
            upload_base: upload_base.trim_end_matches('/').to_string(),
        })
    }

    fn edits_url(&self, package: &str) -> String {
        format!("{}/applications/{}/edits", self.api_base, package)
    }

    fn edit_url(&self, edit: &EditHandle) -> String {
        format!("{}/{}", self.edits_url(edit.package()), edit.id())
    }

    fn upload_edit_url(&self, edit: &EditHandle) -> String {
        format!(
            "{}/applications/{}/edits/{}",
            self.upload_base,
            edit.package(),
            edit.id()
        )
    }

    async fn authorized(&self, request: RequestBuilder) -> ServiceResult<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    async fn execute(&self, operation: &str, request: RequestBuilder) -> ServiceResult<Response> {
        let response = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| ServiceError::Request {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.map_err(|e| e.to_string());
        Err(ServiceError::Status {
            operation: operation.to_string(),
            status: status.as_u16(),
            message: status_message(body),
        })
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: RequestBuilder,
    ) -> ServiceResult<T> {
        self.execute(operation, request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Decode {
                operation: operation.to_string(),
                reason: e.to_string(),
            })
    }

    /// Stream a local file as a media upload
    async fn media_upload(
        &self,
        url: &str,
        content_type: &str,
        file: &Path,
    ) -> ServiceResult<RequestBuilder> {
        let handle = tokio::fs::File::open(file)
            .await
            .map_err(|source| ServiceError::File {
                path: file.to_path_buf(),
                source,
            })?;
        let length = handle
            .metadata()
            .await
            .map_err(|source| ServiceError::File {
                path: file.to_path_buf(),
                source,
            })?
            .len();

        Ok(self
            .http
            .post(url)
            .query(&[("uploadType", "media")])
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, length)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(handle))))
    }
}

impl PlayService for PlayClient {
    async fn open_edit(&self, package: &str) -> ServiceResult<EditHandle> {
        let edit: AppEdit = self
            .execute_json(
                "edits.insert",
                self.http.post(self.edits_url(package)).json(&serde_json::json!({})),
            )
            .await?;
        Ok(EditHandle::new(package, edit.id))
    }

    async fn upload_artifact(
        &self,
        edit: &EditHandle,
        kind: ArtifactKind,
        file: &Path,
    ) -> ServiceResult<i64> {
        let (collection, operation) = match kind {
            ArtifactKind::Apk => ("apks", "edits.apks.upload"),
            ArtifactKind::Aab => ("bundles", "edits.bundles.upload"),
        };
        let url = format!("{}/{}", self.upload_edit_url(edit), collection);
        let request = self.media_upload(&url, kind.mime_type(), file).await?;
        let uploaded: UploadedBinary = self.execute_json(operation, request).await?;
        Ok(uploaded.version_code)
    }

    async fn upload_symbols(
        &self,
        edit: &EditHandle,
        version_code: i64,
        file: &Path,
    ) -> ServiceResult<()> {
        let url = format!(
            "{}/apks/{}/deobfuscationFiles/{}",
            self.upload_edit_url(edit),
            version_code,
            DEOBFUSCATION_TYPE
        );
        let request = self.media_upload(&url, MIME_TYPE_MAPPING, file).await?;
        let uploaded: DeobfuscationUpload = self
            .execute_json("edits.deobfuscationfiles.upload", request)
            .await?;
        log::info!(
            "Mapping file uploaded. Type: [{}]",
            uploaded
                .deobfuscation_file
                .and_then(|f| f.symbol_type)
                .unwrap_or_else(|| DEOBFUSCATION_TYPE.to_string())
        );
        Ok(())
    }

    async fn update_track(
        &self,
        edit: &EditHandle,
        track: &str,
        release: &ReleaseDescriptor,
    ) -> ServiceResult<()> {
        let url = format!("{}/tracks/{}", self.edit_url(edit), track);
        let body = Track::single(track, release);
        self.execute("edits.tracks.update", self.http.put(url).json(&body))
            .await?;
        Ok(())
    }

    async fn commit_edit(&self, edit: &EditHandle) -> ServiceResult<()> {
        let url = format!("{}:commit", self.edit_url(edit));
        self.execute("edits.commit", self.http.post(url)).await?;
        Ok(())
    }

    async fn delete_edit(&self, edit: &EditHandle) -> ServiceResult<()> {
        self.execute("edits.delete", self.http.delete(self.edit_url(edit)))
            .await?;
        Ok(())
    }
}

/// Message of a failed call: the service's `error.message`, else the raw body
fn status_message(body: std::result::Result<String, String>) -> String {
    match body {
        Ok(body) => serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or(body),
        Err(reason) => format!("error body could not be read: {reason}"),
    }
}
