//! Folder (ZIP archive) upload

use crate::api::ApiClient;
use crate::commands::{print_outcome, read_metadata};
use crate::error::{CliError, Result};
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

pub async fn run(server_url: String, archive: PathBuf, metadata: PathBuf) -> Result<()> {
    let metadata = read_metadata(&metadata).await?;
    let client = ApiClient::new(server_url)?;

    info!(archive = %archive.display(), "Uploading folder archive");
    let result = client.upload_folder(&archive, metadata).await?;

    println!("{} {}", "Folder:".bold(), result.folder_prefix);
    for outcome in &result.upload_results {
        print_outcome(outcome);
    }

    let total = result.upload_results.len();
    let failed = result
        .upload_results
        .iter()
        .filter(|outcome| !outcome.is_success())
        .count();

    println!();
    println!("{} of {} files ingested", total - failed, total);

    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::IngestFailed {
            file: archive.display().to_string(),
            message: format!("{} of {} files failed", failed, total),
        })
    }
}
