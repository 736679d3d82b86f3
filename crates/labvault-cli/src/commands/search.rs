//! Search command implementation

use crate::api::ApiClient;
use crate::error::{CliError, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use labvault_common::types::{FileRecord, SearchFilters};
use tracing::debug;

pub async fn run(server_url: String, filters: SearchFilters, json: bool) -> Result<()> {
    filters
        .validate()
        .map_err(|e| CliError::invalid_argument(e.to_string()))?;

    debug!(?filters, "Starting search");

    let client = ApiClient::new(server_url)?;
    let records = client.search(&filters).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No files matched.");
        return Ok(());
    }

    println!("{}", render_table(&records));
    println!("{} file(s)", records.len());
    Ok(())
}

pub fn render_table(records: &[FileRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header([
            "File ID",
            "Project",
            "File",
            "Type",
            "Size",
            "Author",
            "Conducted",
            "Uploaded",
        ]);

    for record in records {
        table.add_row([
            record.file_id.to_string(),
            record.project_id.clone(),
            record.file_name.clone(),
            record.file_type.clone(),
            format_size(record.size_bytes),
            record.author.clone().unwrap_or_default(),
            record
                .date_conducted
                .map(|d| d.to_string())
                .unwrap_or_default(),
            record.upload_timestamp.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    table
}

/// Human-readable byte count in binary units.
pub fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut size = bytes.max(0) as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes.max(0))
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
