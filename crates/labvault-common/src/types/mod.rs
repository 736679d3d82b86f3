//! Wire types shared by the gateway and the CLI

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LabvaultError, Result};

/// Upper bound on rows returned by a catalog search.
pub const MAX_SEARCH_RESULTS: u32 = 100;

/// Content type recorded when the uploader declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// File type recorded when the original name carries no extension.
pub const UNKNOWN_FILE_TYPE: &str = "UNKNOWN";

/// Calendar date template accepted for `date_conducted`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a calendar date in strict `YYYY-MM-DD` form.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| LabvaultError::InvalidDate(raw.to_string()))
}

/// One catalog row describing a stored object.
///
/// Rows are append-only. `file_id` and `upload_timestamp` are assigned by the
/// gateway at ingestion time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: Uuid,
    /// Empty string when the uploader gave no project.
    pub project_id: String,
    /// Original, unsanitized name as uploaded.
    pub file_name: String,
    /// Uppercased extension of `file_name`, or `UNKNOWN`.
    pub file_type: String,
    pub content_type: String,
    pub experiment_type: Option<String>,
    pub author: Option<String>,
    pub date_conducted: Option<NaiveDate>,
    pub size_bytes: i64,
    pub storage_bucket: String,
    pub storage_key: String,
    pub upload_timestamp: DateTime<Utc>,
    pub custom_tags: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Success,
    Error,
}

/// Per-file result of an ingestion.
///
/// An `Error` outcome may still carry `file_id`, `bucket` and `final_key` when
/// the object was written but its catalog row was not. That `file_id` is not
/// in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub status: IngestStatus,
    pub original_filename: String,
    pub file_id: Option<Uuid>,
    pub bucket: Option<String>,
    pub final_key: Option<String>,
    pub message: String,
}

impl IngestOutcome {
    pub fn is_success(&self) -> bool {
        self.status == IngestStatus::Success
    }

    /// Error outcome for a file that never reached the object store.
    pub fn aborted(original_filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: IngestStatus::Error,
            original_filename: original_filename.into(),
            file_id: None,
            bucket: None,
            final_key: None,
            message: message.into(),
        }
    }
}

/// Response body of a folder upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderUploadResult {
    pub folder_prefix: String,
    pub upload_results: Vec<IngestOutcome>,
}

/// Catalog search predicates, combined with AND.
///
/// Text predicates are case-insensitive substring matches. `file_id` is exact.
/// `project_id` also accepts the legacy `research_project_id` parameter name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<Uuid>,
    #[serde(default, alias = "research_project_id", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags_contain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_after: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_before: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl SearchFilters {
    /// Reject filter sets that can never match or exceed the result cap.
    pub fn validate(&self) -> Result<()> {
        if let (Some(after), Some(before)) = (self.date_after, self.date_before) {
            if after > before {
                return Err(LabvaultError::InvalidDateRange {
                    after: after.to_string(),
                    before: before.to_string(),
                });
            }
        }

        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_SEARCH_RESULTS {
                return Err(LabvaultError::InvalidLimit(limit));
            }
        }

        Ok(())
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(MAX_SEARCH_RESULTS)
            .clamp(1, MAX_SEARCH_RESULTS)
    }

    /// Trimmed text predicate, treating empty input as absent.
    pub fn text(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Objects in the bucket that no catalog row references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanReport {
    pub bucket: String,
    pub prefix: String,
    pub scanned: usize,
    pub orphans: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(
            parse_date("2024-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(matches!(parse_date("not-a-date"), Err(LabvaultError::InvalidDate(_))));
        assert!(parse_date("01/03/2024").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn test_outcome_status_serializes_lowercase() {
        let outcome = IngestOutcome {
            status: IngestStatus::Error,
            original_filename: "a.txt".to_string(),
            file_id: None,
            bucket: Some("raw-data".to_string()),
            final_key: Some("a.txt".to_string()),
            message: "Database Connection Error: refused".to_string(),
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["final_key"], "a.txt");
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_filters_accept_legacy_project_key() {
        let filters: SearchFilters =
            serde_json::from_str(r#"{"research_project_id": "neuro-1"}"#).unwrap();
        assert_eq!(filters.project_id.as_deref(), Some("neuro-1"));
    }

    #[test]
    fn test_filters_reject_inverted_date_range() {
        let filters = SearchFilters {
            date_after: NaiveDate::from_ymd_opt(2024, 5, 1),
            date_before: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..Default::default()
        };
        assert!(matches!(
            filters.validate(),
            Err(LabvaultError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_filters_limit_bounds() {
        let mut filters = SearchFilters::default();
        assert_eq!(filters.effective_limit(), MAX_SEARCH_RESULTS);

        filters.limit = Some(0);
        assert!(filters.validate().is_err());

        filters.limit = Some(101);
        assert!(filters.validate().is_err());

        filters.limit = Some(25);
        assert!(filters.validate().is_ok());
        assert_eq!(filters.effective_limit(), 25);
    }

    #[test]
    fn test_text_predicate_ignores_blank() {
        assert_eq!(SearchFilters::text(&Some("  ".to_string())), None);
        assert_eq!(SearchFilters::text(&Some(" Lin ".to_string())), Some("Lin"));
        assert_eq!(SearchFilters::text(&None), None);
    }
}
