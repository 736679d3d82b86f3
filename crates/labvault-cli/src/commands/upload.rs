//! Single-file upload

use crate::api::ApiClient;
use crate::commands::{print_outcome, read_metadata};
use crate::error::{CliError, Result};
use std::path::PathBuf;
use tracing::info;

pub async fn run(
    server_url: String,
    file: PathBuf,
    metadata: PathBuf,
    content_type: String,
) -> Result<()> {
    let metadata = read_metadata(&metadata).await?;
    let client = ApiClient::new(server_url)?;

    info!(file = %file.display(), %content_type, "Uploading file");
    let outcome = client.upload_file(&file, metadata, &content_type).await?;

    print_outcome(&outcome);

    if outcome.is_success() {
        Ok(())
    } else {
        Err(CliError::IngestFailed {
            file: outcome.original_filename,
            message: outcome.message,
        })
    }
}
