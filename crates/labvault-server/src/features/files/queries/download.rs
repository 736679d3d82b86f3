use uuid::Uuid;

use crate::db::{Catalog, CatalogError};
use crate::storage::{ObjectStore, ObjectStream, StorageError};

#[derive(Debug, Clone)]
pub struct DownloadFileQuery {
    pub file_id: Uuid,
}

pub struct DownloadFileResponse {
    pub file_name: String,
    pub content_type: String,
    pub stream: ObjectStream,
}

impl std::fmt::Debug for DownloadFileResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadFileResponse")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadFileError {
    #[error("File with ID {0} not found.")]
    NotFound(Uuid),
    #[error("File record found, but data does not exist in storage.")]
    ObjectMissing,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Error retrieving file from storage: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for DownloadFileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => DownloadFileError::ObjectMissing,
            other => DownloadFileError::Storage(other),
        }
    }
}

#[tracing::instrument(skip(catalog, objects))]
pub async fn handle(
    catalog: &dyn Catalog,
    objects: &dyn ObjectStore,
    query: DownloadFileQuery,
) -> Result<DownloadFileResponse, DownloadFileError> {
    let location = catalog
        .lookup_location(query.file_id)
        .await?
        .ok_or(DownloadFileError::NotFound(query.file_id))?;

    tracing::info!(
        bucket = %location.bucket,
        storage_key = %location.key,
        "Proxying download"
    );

    let stream = objects
        .get(&location.bucket, &location.key)
        .await
        .map_err(|err| {
            if matches!(err, StorageError::NotFound { .. }) {
                tracing::error!(
                    file_id = %query.file_id,
                    storage_key = %location.key,
                    "Catalog row points at a missing object"
                );
            }
            DownloadFileError::from(err)
        })?;

    Ok(DownloadFileResponse {
        file_name: location.file_name,
        content_type: location.content_type,
        stream,
    })
}

/// `Content-Disposition` value with an ASCII fallback name and the exact
/// UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
    }

    #[test]
    fn test_content_disposition_escapes_unsafe_names() {
        let value = content_disposition("résumé \"v2\".txt");
        assert!(value.starts_with("attachment; filename=\"r_sum_ _v2_.txt\";"));
        assert!(value.ends_with("filename*=UTF-8''r%C3%A9sum%C3%A9%20%22v2%22.txt"));
    }

    #[test]
    fn test_missing_object_maps_to_object_missing() {
        let err = DownloadFileError::from(StorageError::NotFound {
            bucket: "raw-data".into(),
            key: "a.txt".into(),
        });
        assert!(matches!(err, DownloadFileError::ObjectMissing));
    }
}
