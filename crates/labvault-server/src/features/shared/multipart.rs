//! Multipart upload form handling
//!
//! Upload forms carry one payload part and one YAML metadata part. The payload
//! is spooled to disk chunk by chunk; the metadata is small and kept in memory.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::AppError;

/// Upper bound for the metadata document.
pub const MAX_METADATA_BYTES: usize = 1024 * 1024;

const SPOOL_FILE_NAME: &str = "payload.upload";

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Missing required form field '{0}'")]
    MissingField(&'static str),

    #[error("Malformed multipart body: {0}")]
    Malformed(#[from] MultipartError),

    #[error("Metadata document exceeds {} bytes", MAX_METADATA_BYTES)]
    MetadataTooLarge,

    #[error("Failed to spool upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Io(_) => AppError::Internal(err.to_string()),
            _ => AppError::Validation(err.to_string()),
        }
    }
}

/// Payload part written to local disk
#[derive(Debug, Clone)]
pub struct SpooledFile {
    /// Client-supplied file name; empty when the part carried none
    pub file_name: String,
    pub content_type: Option<String>,
    pub path: PathBuf,
    pub size_bytes: u64,
}

#[derive(Debug)]
pub struct UploadForm {
    pub file: SpooledFile,
    pub metadata: Bytes,
}

/// Read an upload form, spooling the `file_field` part into `dir`.
///
/// Parts may arrive in any order and unknown parts are ignored.
pub async fn read_upload_form(
    multipart: &mut Multipart,
    dir: &Path,
    file_field: &'static str,
    metadata_field: &'static str,
) -> Result<UploadForm, FormError> {
    let mut file = None;
    let mut metadata = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            file = Some(spool(field, &dir.join(SPOOL_FILE_NAME)).await?);
        } else if name == metadata_field {
            metadata = Some(read_small(field, MAX_METADATA_BYTES).await?);
        } else {
            tracing::debug!(field = %name, "Ignoring unexpected form field");
        }
    }

    Ok(UploadForm {
        file: file.ok_or(FormError::MissingField(file_field))?,
        metadata: metadata.ok_or(FormError::MissingField(metadata_field))?,
    })
}

async fn spool(mut field: Field<'_>, path: &Path) -> Result<SpooledFile, FormError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);

    let mut out = File::create(path).await?;
    let mut size_bytes = 0u64;

    while let Some(chunk) = field.chunk().await? {
        size_bytes += chunk.len() as u64;
        out.write_all(&chunk).await?;
    }
    out.flush().await?;

    tracing::debug!(file_name = %file_name, size_bytes, "Upload spooled to disk");

    Ok(SpooledFile {
        file_name,
        content_type,
        path: path.to_path_buf(),
        size_bytes,
    })
}

async fn read_small(mut field: Field<'_>, limit: usize) -> Result<Bytes, FormError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Err(FormError::MetadataTooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}
