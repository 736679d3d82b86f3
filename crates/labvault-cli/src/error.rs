//! Error types for the LabVault CLI
//!
//! Messages are shown to the user as-is, so each one says what went wrong and
//! what to try next.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// The gateway answered with an error envelope
    #[error("Server rejected the request ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The gateway answered with something other than the expected envelope
    #[error("Unexpected server response ({status}): {body}. Check that --server-url points at a LabVault gateway.")]
    UnexpectedResponse { status: u16, body: String },

    /// An upload reached the gateway but was not fully ingested
    #[error("Ingestion of '{file}' failed: {message}")]
    IngestFailed { file: String, message: String },

    #[error("File not found: '{0}'. Verify the path exists and is readable.")]
    FileNotFound(String),

    /// The metadata document was rejected before upload
    #[error("Invalid metadata file '{path}': {reason}")]
    InvalidMetadata { path: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    #[error("Network request failed: {0}. Ensure the LabVault server is running (check with 'labvault status') and reachable.")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_metadata(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
