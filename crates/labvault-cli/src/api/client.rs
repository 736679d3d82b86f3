//! HTTP API client for the LabVault gateway
//!
//! Uploads are streamed from disk as multipart bodies; downloads are handed
//! back as a live response so the caller can stream them to disk.

use crate::api::{endpoints, types::*};
use crate::error::{CliError, Result};
use bytes::Bytes;
use labvault_common::types::{
    FileRecord, FolderUploadResult, IngestOutcome, OrphanReport, SearchFilters,
};
use reqwest::{multipart, Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

// ============================================================================
// API Client Constants
// ============================================================================

/// Default timeout for API requests in seconds.
/// Can be overridden via LABVAULT_API_TIMEOUT_SECS environment variable.
/// Set to one hour to accommodate large uploads and downloads.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 3600;

/// Default gateway URL when not specified via flag or environment variable.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

const TIMEOUT_ENV: &str = "LABVAULT_API_TIMEOUT_SECS";

/// Error bodies are cut to this many characters in messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// API client for the LabVault gateway
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let timeout_secs = std::env::var(TIMEOUT_ENV)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_API_TIMEOUT_SECS);

        Self::with_timeout(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn status(&self) -> Result<ServiceStatus> {
        let url = endpoints::status_url(&self.base_url);
        debug!(%url, "Fetching service status");

        let response = self.client.get(&url).send().await?;
        let (status, body) = read_body(response).await?;
        if !status.is_success() {
            return Err(error_from(status, &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Catalog health. A 503 is a valid answer and is returned as an
    /// unhealthy status rather than an error.
    pub async fn health(&self) -> Result<HealthStatus> {
        let url = endpoints::health_url(&self.base_url);
        debug!(%url, "Checking gateway health");

        let response = self.client.get(&url).send().await?;
        let (status, body) = read_body(response).await?;
        if !status.is_success() && status != StatusCode::SERVICE_UNAVAILABLE {
            return Err(error_from(status, &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Upload one file with its YAML metadata.
    ///
    /// An upload the gateway stored but could not catalog comes back as an
    /// `Ok` outcome with error status, so the caller can show the orphaned key.
    pub async fn upload_file(
        &self,
        file: &Path,
        metadata: Vec<u8>,
        content_type: &str,
    ) -> Result<IngestOutcome> {
        let url = endpoints::upload_file_url(&self.base_url);
        debug!(%url, file = %file.display(), "Uploading file");

        let form = multipart::Form::new()
            .part("data_file", file_part(file, content_type).await?)
            .part("metadata_file", metadata_part(metadata)?);

        let response = self.client.post(&url).multipart(form).send().await?;
        let (status, body) = read_body(response).await?;

        if !status.is_success() {
            if let Some(outcome) = failed_outcome(&body) {
                return Ok(outcome);
            }
            return Err(error_from(status, &body));
        }

        Ok(parse_envelope::<IngestOutcome>(&body)?.data)
    }

    /// Upload a ZIP archive whose files share one metadata document.
    pub async fn upload_folder(&self, archive: &Path, metadata: Vec<u8>) -> Result<FolderUploadResult> {
        let url = endpoints::upload_folder_url(&self.base_url);
        debug!(%url, archive = %archive.display(), "Uploading folder archive");

        let form = multipart::Form::new()
            .part("zip_file", file_part(archive, "application/zip").await?)
            .part("metadata_file", metadata_part(metadata)?);

        let response = self.client.post(&url).multipart(form).send().await?;
        Ok(expect_envelope::<FolderUploadResult>(response).await?.data)
    }

    pub async fn search(&self, filters: &SearchFilters) -> Result<Vec<FileRecord>> {
        let url = endpoints::search_url(&self.base_url, filters);
        debug!(%url, "Searching catalog");

        let response = self.client.get(&url).send().await?;
        Ok(expect_envelope::<Vec<FileRecord>>(response).await?.data)
    }

    /// Start a download. The returned response has a success status and an
    /// unread body.
    pub async fn download(&self, file_id: Uuid) -> Result<Response> {
        let url = endpoints::download_url(&self.base_url, file_id);
        debug!(%url, "Requesting download");

        let response = self.client.get(&url).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let (status, body) = read_body(response).await?;
        Err(error_from(status, &body))
    }

    pub async fn orphans(&self, prefix: Option<&str>, limit: Option<usize>) -> Result<OrphanReport> {
        let url = endpoints::orphans_url(&self.base_url, prefix, limit);
        debug!(%url, "Requesting orphan report");

        let response = self.client.get(&url).send().await?;
        Ok(expect_envelope::<OrphanReport>(response).await?.data)
    }
}

async fn file_part(path: &Path, content_type: &str) -> Result<multipart::Part> {
    let file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CliError::FileNotFound(path.display().to_string())
        } else {
            e.into()
        }
    })?;
    let length = file.metadata().await?.len();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let body = Body::wrap_stream(ReaderStream::new(file));
    Ok(multipart::Part::stream_with_length(body, length)
        .file_name(file_name)
        .mime_str(content_type)?)
}

fn metadata_part(metadata: Vec<u8>) -> Result<multipart::Part> {
    Ok(multipart::Part::bytes(metadata)
        .file_name("metadata.yaml")
        .mime_str("application/x-yaml")?)
}

async fn read_body(response: Response) -> Result<(StatusCode, Bytes)> {
    let status = response.status();
    let body = response.bytes().await?;
    Ok((status, body))
}

async fn expect_envelope<T: DeserializeOwned>(response: Response) -> Result<ApiResponse<T>> {
    let (status, body) = read_body(response).await?;
    if !status.is_success() {
        return Err(error_from(status, &body));
    }
    parse_envelope(&body)
}

fn parse_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<ApiResponse<T>> {
    Ok(serde_json::from_slice(body)?)
}

/// The outcome carried by an `INGEST_FAILED` error envelope, if any.
fn failed_outcome(body: &[u8]) -> Option<IngestOutcome> {
    let envelope: ErrorResponse = serde_json::from_slice(body).ok()?;
    if envelope.error.code != "INGEST_FAILED" {
        return None;
    }
    serde_json::from_value(envelope.error.details?).ok()
}

fn error_from(status: StatusCode, body: &[u8]) -> CliError {
    match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(envelope) => CliError::Api {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
        },
        Err(_) => CliError::UnexpectedResponse {
            status: status.as_u16(),
            body: String::from_utf8_lossy(body)
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect(),
        },
    }
}
