//! Upload ingestion
//!
//! Every uploaded file, whether sent alone or extracted from a ZIP archive,
//! goes through the same steps:
//!
//! 1. **sanitize**: the original name and project become safe key segments
//! 2. **keys**: the desired key is probed and suffixed `(n)` until it is free
//! 3. **pipeline**: the object is written, then its catalog row
//!
//! `metadata` decodes the YAML sidecar that accompanies an upload and
//! `archive` unpacks folder uploads into a scratch directory.
//!
//! The object write always precedes the catalog write. A catalog failure
//! after a successful write leaves an orphaned object behind; it is logged
//! and reported in the outcome, never rolled back.

pub mod archive;
pub mod keys;
pub mod metadata;
pub mod pipeline;
pub mod sanitize;

pub use keys::{resolve_unique_key, DesiredKey, MAX_KEY_ATTEMPTS};
pub use metadata::{MetadataError, UploadMetadata};
pub use pipeline::{IngestPipeline, IngestRequest};

use thiserror::Error;

use crate::storage::StorageError;

/// Failures that abort an ingestion before any catalog row is attempted.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to check whether '{key}' exists in storage: {source}")]
    KeyProbe {
        key: String,
        #[source]
        source: StorageError,
    },

    #[error("Upload size of {size} bytes cannot be recorded in the catalog")]
    SizeOutOfRange { size: u64 },

    #[error("No free storage key for '{desired}' after {attempts} attempts")]
    NameSpaceExhausted { desired: String, attempts: u32 },

    #[error("Failed to write '{key}' to storage: {source}")]
    ObjectWrite {
        key: String,
        #[source]
        source: StorageError,
    },
}

pub type IngestResult<T> = Result<T, IngestError>;
