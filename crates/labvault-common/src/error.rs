//! Error types shared across LabVault crates

use thiserror::Error;

/// Result type alias for shared-type operations
pub type Result<T> = std::result::Result<T, LabvaultError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LabvaultError {
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid date range: date_after ({after}) is later than date_before ({before})")]
    InvalidDateRange { after: String, before: String },

    #[error("Invalid limit {0}: must be between 1 and {max}", max = crate::types::MAX_SEARCH_RESULTS)]
    InvalidLimit(u32),
}
