//! Command implementations
//!
//! Each command takes the gateway URL and its parsed arguments, prints
//! user-facing output to stdout and returns an error for a non-zero exit.

pub mod download;
pub mod orphans;
pub mod search;
pub mod status;
pub mod upload;
pub mod upload_folder;

use crate::error::{CliError, Result};
use colored::Colorize;
use labvault_common::types::IngestOutcome;
use serde_yaml::Value;
use std::path::Path;

/// Read a metadata document and check that its top level is a mapping, the
/// same shape the gateway accepts.
pub async fn read_metadata(path: &Path) -> Result<Vec<u8>> {
    let raw = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CliError::FileNotFound(path.display().to_string())
        } else {
            e.into()
        }
    })?;

    validate_metadata(&raw)
        .map_err(|reason| CliError::invalid_metadata(path.display().to_string(), reason))?;
    Ok(raw)
}

fn validate_metadata(raw: &[u8]) -> std::result::Result<(), String> {
    let mut value: Value = serde_yaml::from_slice(raw).map_err(|e| e.to_string())?;
    while let Value::Tagged(tagged) = value {
        value = tagged.value;
    }

    match value {
        Value::Mapping(_) => Ok(()),
        _ => Err("the document must be a mapping of field names to values".to_string()),
    }
}

pub(crate) fn print_outcome(outcome: &IngestOutcome) {
    if outcome.is_success() {
        println!(
            "{} {} -> {}",
            "✓".green(),
            outcome.original_filename.bold(),
            outcome.final_key.as_deref().unwrap_or_default()
        );
        if let Some(file_id) = outcome.file_id {
            println!("    file id: {}", file_id);
        }
        return;
    }

    println!(
        "{} {}: {}",
        "✗".red(),
        outcome.original_filename.bold(),
        outcome.message
    );
    if let (Some(bucket), Some(key)) = (&outcome.bucket, &outcome.final_key) {
        println!(
            "    {} stored as {}/{} without a catalog row",
            "!".yellow(),
            bucket,
            key
        );
        if let Some(file_id) = outcome.file_id {
            println!("    intended file id: {}", file_id);
        }
    }
}
