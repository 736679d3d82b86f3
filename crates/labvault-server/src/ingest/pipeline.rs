use chrono::Utc;
use labvault_common::types::{FileRecord, IngestOutcome, IngestStatus, DEFAULT_CONTENT_TYPE};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::keys::{resolve_unique_key, DesiredKey};
use super::metadata::UploadMetadata;
use super::sanitize::{file_extension, sanitize_file_name, sanitize_project_id};
use super::{IngestError, IngestResult};
use crate::db::Catalog;
use crate::storage::{ObjectStore, Payload};

/// Message carried by a successful outcome.
pub const SUCCESS_MESSAGE: &str = "Metadata stored successfully.";

/// One file to ingest.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub payload: Payload,
    /// Name as supplied by the uploader, stored verbatim in the catalog
    pub original_name: String,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub metadata: UploadMetadata,
    /// Already sanitized. Empty for single-file uploads.
    pub folder_prefix: String,
}

/// Stores one file's bytes, then its catalog row.
#[derive(Clone)]
pub struct IngestPipeline {
    objects: Arc<dyn ObjectStore>,
    catalog: Arc<dyn Catalog>,
    bucket: String,
}

impl IngestPipeline {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        catalog: Arc<dyn Catalog>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            objects,
            catalog,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Ingest a single file.
    ///
    /// Errors that happen before or during the object write are returned as
    /// `Err` and leave no catalog row. A catalog failure after the write is
    /// reported as an `Error` outcome that still names the written key and
    /// the id the row would have had.
    #[instrument(
        skip(self, request),
        fields(original_name = %request.original_name, size_bytes = request.size_bytes)
    )]
    pub async fn ingest(&self, request: IngestRequest) -> IngestResult<IngestOutcome> {
        let size_bytes = i64::try_from(request.size_bytes).map_err(|_| {
            IngestError::SizeOutOfRange {
                size: request.size_bytes,
            }
        })?;

        let project_prefix =
            sanitize_project_id(request.metadata.project_id.as_deref().unwrap_or_default());
        let desired = DesiredKey::new(
            project_prefix,
            request.folder_prefix.as_str(),
            sanitize_file_name(&request.original_name),
        );

        let key = resolve_unique_key(self.objects.as_ref(), &self.bucket, &desired).await?;

        let content_type = request
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        self.objects
            .put(
                &self.bucket,
                &key,
                request.payload,
                request.size_bytes,
                &content_type,
            )
            .await
            .map_err(|source| IngestError::ObjectWrite {
                key: key.clone(),
                source,
            })?;

        let record = FileRecord {
            file_id: Uuid::new_v4(),
            project_id: request.metadata.project_id.clone().unwrap_or_default(),
            file_name: request.original_name.clone(),
            file_type: file_extension(&request.original_name),
            content_type,
            experiment_type: request.metadata.experiment_type.clone(),
            author: request.metadata.author.clone(),
            date_conducted: request.metadata.conducted_on(),
            size_bytes,
            storage_bucket: self.bucket.clone(),
            storage_key: key.clone(),
            upload_timestamp: Utc::now(),
            custom_tags: request.metadata.custom_tags.clone(),
        };

        match self.catalog.insert(&record).await {
            Ok(()) => {
                info!(file_id = %record.file_id, storage_key = %key, "File ingested");
                Ok(IngestOutcome {
                    status: IngestStatus::Success,
                    original_filename: request.original_name,
                    file_id: Some(record.file_id),
                    bucket: Some(self.bucket.clone()),
                    final_key: Some(key),
                    message: SUCCESS_MESSAGE.to_string(),
                })
            },
            Err(err) => {
                warn!(
                    orphaned = true,
                    bucket = %self.bucket,
                    storage_key = %key,
                    error = %err,
                    "Object stored but catalog write failed"
                );
                Ok(IngestOutcome {
                    status: IngestStatus::Error,
                    original_filename: request.original_name,
                    file_id: Some(record.file_id),
                    bucket: Some(self.bucket.clone()),
                    final_key: Some(key),
                    message: err.to_string(),
                })
            },
        }
    }
}
