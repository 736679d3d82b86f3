//! YAML metadata sidecar decoding

use chrono::NaiveDate;
use labvault_common::types::parse_date;
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Invalid or malformed metadata YAML file: {0}")]
    Syntax(#[from] serde_yaml::Error),

    #[error("Invalid or malformed metadata YAML file: YAML content could not be parsed into a dictionary.")]
    NotAMapping,

    #[error("Invalid or malformed metadata YAML file: field '{0}' must be a scalar value")]
    InvalidField(String),
}

/// User metadata attached to an upload. Every field is optional and unknown
/// keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetadata {
    pub project_id: Option<String>,
    pub author: Option<String>,
    pub experiment_type: Option<String>,
    /// Raw value as supplied. See [`UploadMetadata::conducted_on`].
    pub date_conducted: Option<String>,
    pub custom_tags: Option<String>,
}

impl UploadMetadata {
    /// Decode a YAML document whose top level must be a mapping.
    ///
    /// Scalars of any type are kept in their textual form. `custom_tags` may
    /// also be a list, which is joined with `", "`. `research_project_id` is
    /// accepted when `project_id` is absent.
    pub fn from_yaml(raw: &[u8]) -> Result<Self, MetadataError> {
        let document: Value = serde_yaml::from_slice(raw)?;

        let Value::Mapping(mapping) = untag(document) else {
            return Err(MetadataError::NotAMapping);
        };

        let mut metadata = UploadMetadata::default();
        let mut legacy_project_id = None;

        for (key, value) in mapping {
            let Some(name) = key.as_str() else {
                debug!("Ignoring metadata entry with non-string key");
                continue;
            };

            match name {
                "project_id" => metadata.project_id = scalar(name, value)?,
                "research_project_id" => legacy_project_id = scalar(name, value)?,
                "author" => metadata.author = scalar(name, value)?,
                "experiment_type" => metadata.experiment_type = scalar(name, value)?,
                "date_conducted" => metadata.date_conducted = scalar(name, value)?,
                "custom_tags" => metadata.custom_tags = tags(value)?,
                other => debug!(key = other, "Ignoring unknown metadata key"),
            }
        }

        if metadata.project_id.is_none() {
            metadata.project_id = legacy_project_id;
        }

        Ok(metadata)
    }

    /// `date_conducted` as a calendar date. Unparseable values are logged and
    /// treated as absent.
    pub fn conducted_on(&self) -> Option<NaiveDate> {
        let raw = self.date_conducted.as_deref()?;
        if raw.trim().is_empty() {
            return None;
        }

        match parse_date(raw) {
            Ok(date) => Some(date),
            Err(_) => {
                warn!("Invalid date format: '{}'. Storing as null.", raw);
                None
            },
        }
    }
}

fn untag(value: Value) -> Value {
    match value {
        Value::Tagged(tagged) => untag(tagged.value),
        other => other,
    }
}

fn scalar(name: &str, value: Value) -> Result<Option<String>, MetadataError> {
    match untag(value) {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s)),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            Err(MetadataError::InvalidField(name.to_string()))
        },
    }
}

fn tags(value: Value) -> Result<Option<String>, MetadataError> {
    match untag(value) {
        Value::Sequence(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                if let Some(part) = scalar("custom_tags", item)? {
                    parts.push(part);
                }
            }
            Ok(Some(parts.join(", ")))
        },
        other => scalar("custom_tags", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_document() {
        let yaml = b"project_id: neuro-1\nauthor: Dr. Lin\nexperiment_type: EEG\n\
                     date_conducted: 2024-03-01\ncustom_tags: sleep, baseline\n";

        let metadata = UploadMetadata::from_yaml(yaml).unwrap();
        assert_eq!(metadata.project_id.as_deref(), Some("neuro-1"));
        assert_eq!(metadata.author.as_deref(), Some("Dr. Lin"));
        assert_eq!(metadata.custom_tags.as_deref(), Some("sleep, baseline"));
        assert_eq!(metadata.conducted_on(), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn test_empty_mapping_and_unknown_keys() {
        let metadata = UploadMetadata::from_yaml(b"{}").unwrap();
        assert_eq!(metadata, UploadMetadata::default());

        let metadata = UploadMetadata::from_yaml(b"instrument: MRI\nauthor: Kim\n").unwrap();
        assert_eq!(metadata.author.as_deref(), Some("Kim"));
    }

    #[test]
    fn test_non_mapping_is_rejected() {
        let documents: [&[u8]; 3] = [b"- a\n- b\n", b"just text", b""];
        for doc in documents {
            let err = UploadMetadata::from_yaml(doc).unwrap_err();
            assert!(err
                .to_string()
                .starts_with("Invalid or malformed metadata YAML file"));
        }
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let err = UploadMetadata::from_yaml(b"author: [unclosed").unwrap_err();
        assert!(matches!(err, MetadataError::Syntax(_)));
    }

    #[test]
    fn test_scalars_keep_textual_form() {
        let metadata =
            UploadMetadata::from_yaml(b"project_id: 42\nauthor: true\nexperiment_type: ~\n").unwrap();
        assert_eq!(metadata.project_id.as_deref(), Some("42"));
        assert_eq!(metadata.author.as_deref(), Some("true"));
        assert_eq!(metadata.experiment_type, None);
    }

    #[test]
    fn test_nested_value_is_rejected() {
        let err = UploadMetadata::from_yaml(b"author:\n  name: Lin\n").unwrap_err();
        assert!(matches!(err, MetadataError::InvalidField(ref f) if f == "author"));
    }

    #[test]
    fn test_tag_list_is_joined() {
        let metadata = UploadMetadata::from_yaml(b"custom_tags: [eeg, pilot, 3]\n").unwrap();
        assert_eq!(metadata.custom_tags.as_deref(), Some("eeg, pilot, 3"));
    }

    #[test]
    fn test_legacy_project_key() {
        let metadata = UploadMetadata::from_yaml(b"research_project_id: onc-7\n").unwrap();
        assert_eq!(metadata.project_id.as_deref(), Some("onc-7"));

        let metadata =
            UploadMetadata::from_yaml(b"research_project_id: old\nproject_id: new\n").unwrap();
        assert_eq!(metadata.project_id.as_deref(), Some("new"));
    }

    #[test]
    fn test_invalid_date_is_absent() {
        let metadata = UploadMetadata::from_yaml(b"date_conducted: 03/01/2024\n").unwrap();
        assert_eq!(metadata.date_conducted.as_deref(), Some("03/01/2024"));
        assert_eq!(metadata.conducted_on(), None);
    }
}
