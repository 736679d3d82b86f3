use labvault_common::types::{FolderUploadResult, IngestOutcome};
use std::path::PathBuf;
use uuid::Uuid;

use crate::features::shared::SpooledFile;
use crate::ingest::archive::{extract_zip, ArchiveError};
use crate::ingest::sanitize::{sanitize_file_name, split_extension};
use crate::ingest::{IngestError, IngestPipeline, IngestRequest, MetadataError, UploadMetadata};
use crate::storage::Payload;

const EXTRACT_DIR: &str = "extracted";

#[derive(Debug, Clone)]
pub struct UploadFolderCommand {
    pub archive: SpooledFile,
    /// Raw YAML metadata document, applied to every file in the archive
    pub metadata: bytes::Bytes,
    /// Scoped directory the archive is extracted into
    pub scratch_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadFolderError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("Archive extraction task failed: {0}")]
    Extraction(#[from] tokio::task::JoinError),
    /// The object store could not be probed, so no remaining file can be
    /// ingested either.
    #[error(transparent)]
    Ingest(IngestError),
}

/// Unique storage folder for one archive: its sanitized stem plus eight hex
/// characters of a fresh UUID.
pub fn folder_prefix(archive_name: &str) -> String {
    let (stem, _) = split_extension(archive_name);
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", sanitize_file_name(stem), &suffix[..8])
}

#[tracing::instrument(skip(pipeline, command), fields(archive = %command.archive.file_name))]
pub async fn handle(
    pipeline: &IngestPipeline,
    command: UploadFolderCommand,
) -> Result<FolderUploadResult, UploadFolderError> {
    let metadata = UploadMetadata::from_yaml(&command.metadata)?;

    let archive_path = command.archive.path.clone();
    let dest = command.scratch_dir.join(EXTRACT_DIR);
    let entries =
        tokio::task::spawn_blocking(move || extract_zip(&archive_path, &dest)).await??;

    let folder_prefix = folder_prefix(&command.archive.file_name);
    tracing::info!(%folder_prefix, files = entries.len(), "Ingesting archive contents");

    let mut upload_results = Vec::with_capacity(entries.len());
    for entry in entries {
        let request = IngestRequest {
            payload: Payload::File(entry.path),
            original_name: entry.file_name.clone(),
            content_type: None,
            size_bytes: entry.size_bytes,
            metadata: metadata.clone(),
            folder_prefix: folder_prefix.clone(),
        };

        let outcome = match pipeline.ingest(request).await {
            Ok(outcome) => outcome,
            Err(err @ IngestError::KeyProbe { .. }) => {
                tracing::error!(
                    file = %entry.file_name,
                    error = %err,
                    "Object store unusable, aborting folder upload"
                );
                return Err(UploadFolderError::Ingest(err));
            },
            Err(err) => {
                tracing::error!(file = %entry.file_name, error = %err, "Ingestion aborted");
                IngestOutcome::aborted(entry.file_name, err.to_string())
            },
        };
        upload_results.push(outcome);
    }

    Ok(FolderUploadResult {
        folder_prefix,
        upload_results,
    })
}
