use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::{
    commands::{self, UploadFileCommand, UploadFileError, UploadFolderCommand, UploadFolderError},
    queries::{self, download::content_disposition, DownloadFileError, DownloadFileQuery},
};
use crate::api::response::{ApiResponse, ErrorResponse};
use crate::error::AppError;
use crate::features::shared::{read_upload_form, FormError};
use crate::features::FeatureState;
use crate::ingest::IngestError;

pub fn files_routes() -> Router<FeatureState> {
    Router::new()
        .route("/uploadfile/", post(upload_file))
        .route("/uploadfile", post(upload_file))
        .route("/upload_folder/", post(upload_folder))
        .route("/upload_folder", post(upload_folder))
        .route("/download/:file_id", get(download_file))
}

#[tracing::instrument(skip(state, multipart))]
async fn upload_file(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> Result<Response, FileApiError> {
    let scratch = tempfile::tempdir().map_err(FormError::Io)?;
    let form =
        read_upload_form(&mut multipart, scratch.path(), "data_file", "metadata_file").await?;

    let command = UploadFileCommand {
        file: form.file,
        metadata: form.metadata,
    };

    let outcome = commands::upload::handle(&state.pipeline, command).await?;

    if outcome.is_success() {
        return Ok(ApiResponse::success(outcome).into_response());
    }

    let details = serde_json::to_value(&outcome).unwrap_or_default();
    let error = ErrorResponse::with_details("INGEST_FAILED", outcome.message, details);
    Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response())
}

#[tracing::instrument(skip(state, multipart))]
async fn upload_folder(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> Result<Response, FileApiError> {
    let scratch = tempfile::tempdir().map_err(FormError::Io)?;
    let form =
        read_upload_form(&mut multipart, scratch.path(), "zip_file", "metadata_file").await?;

    let command = UploadFolderCommand {
        archive: form.file,
        metadata: form.metadata,
        scratch_dir: scratch.path().to_path_buf(),
    };

    let result = commands::upload_folder::handle(&state.pipeline, command).await?;

    let failed = result.upload_results.iter().filter(|o| !o.is_success()).count();
    tracing::info!(
        folder_prefix = %result.folder_prefix,
        files = result.upload_results.len(),
        failed,
        "Folder upload finished"
    );

    Ok(ApiResponse::success(result).into_response())
}

#[tracing::instrument(skip(state))]
async fn download_file(
    State(state): State<FeatureState>,
    Path(file_id): Path<String>,
) -> Result<Response, FileApiError> {
    let file_id = Uuid::parse_str(file_id.trim())
        .map_err(|_| FileApiError::InvalidId(file_id.clone()))?;

    let response = queries::download::handle(
        state.catalog.as_ref(),
        state.objects.as_ref(),
        DownloadFileQuery { file_id },
    )
    .await?;

    let headers = [
        (header::CONTENT_TYPE, response.content_type),
        (header::CONTENT_DISPOSITION, content_disposition(&response.file_name)),
    ];

    Ok((headers, Body::from_stream(response.stream)).into_response())
}

#[derive(Debug, thiserror::Error)]
enum FileApiError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Upload(#[from] UploadFileError),
    #[error(transparent)]
    Folder(#[from] UploadFolderError),
    #[error(transparent)]
    Download(#[from] DownloadFileError),
    #[error("Invalid file ID '{0}': expected a UUID")]
    InvalidId(String),
}

fn ingest_error(err: IngestError) -> AppError {
    match err {
        IngestError::KeyProbe { .. } | IngestError::ObjectWrite { .. } => {
            AppError::Storage(err.to_string())
        },
        IngestError::NameSpaceExhausted { .. } | IngestError::SizeOutOfRange { .. } => {
            AppError::Internal(err.to_string())
        },
    }
}

impl From<FileApiError> for AppError {
    fn from(err: FileApiError) -> Self {
        match err {
            FileApiError::Form(e) => e.into(),
            FileApiError::InvalidId(_) => AppError::Validation(err.to_string()),

            FileApiError::Upload(UploadFileError::Metadata(e))
            | FileApiError::Folder(UploadFolderError::Metadata(e)) => {
                AppError::Validation(e.to_string())
            },
            FileApiError::Upload(UploadFileError::Ingest(e))
            | FileApiError::Folder(UploadFolderError::Ingest(e)) => ingest_error(e),

            FileApiError::Folder(UploadFolderError::Archive(e)) if e.is_invalid_input() => {
                AppError::Validation(e.to_string())
            },
            FileApiError::Folder(e) => AppError::Internal(e.to_string()),

            FileApiError::Download(
                e @ (DownloadFileError::NotFound(_) | DownloadFileError::ObjectMissing),
            ) => AppError::NotFound(e.to_string()),
            FileApiError::Download(DownloadFileError::Catalog(e)) => e.into(),
            FileApiError::Download(e @ DownloadFileError::Storage(_)) => {
                AppError::Storage(e.to_string())
            },
        }
    }
}

impl IntoResponse for FileApiError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
