use labvault_common::types::IngestOutcome;

use crate::features::shared::SpooledFile;
use crate::ingest::{IngestError, IngestPipeline, IngestRequest, MetadataError, UploadMetadata};
use crate::storage::Payload;

#[derive(Debug, Clone)]
pub struct UploadFileCommand {
    pub file: SpooledFile,
    /// Raw YAML metadata document
    pub metadata: bytes::Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadFileError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("An unexpected error occurred: {0}")]
    Ingest(#[from] IngestError),
}

#[tracing::instrument(skip(pipeline, command), fields(file_name = %command.file.file_name))]
pub async fn handle(
    pipeline: &IngestPipeline,
    command: UploadFileCommand,
) -> Result<IngestOutcome, UploadFileError> {
    let metadata = UploadMetadata::from_yaml(&command.metadata)?;

    let request = IngestRequest {
        payload: Payload::File(command.file.path),
        original_name: command.file.file_name,
        content_type: command.file.content_type,
        size_bytes: command.file.size_bytes,
        metadata,
        folder_prefix: String::new(),
    };

    Ok(pipeline.ingest(request).await?)
}
