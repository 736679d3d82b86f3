//! Download command implementation
//!
//! The body is streamed to disk chunk by chunk. A partially written file is
//! removed when the transfer fails.

use crate::api::ApiClient;
use crate::error::Result;
use colored::Colorize;
use futures::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Response;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

pub async fn run(server_url: String, file_id: Uuid, output: Option<PathBuf>) -> Result<()> {
    let client = ApiClient::new(server_url)?;
    let response = client.download(file_id).await?;

    let suggested = response
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(file_name_from_disposition)
        .unwrap_or_else(|| file_id.to_string());

    let dest = resolve_destination(output.as_deref(), &suggested);
    debug!(dest = %dest.display(), "Writing download");

    let written = match write_body(response, &dest).await {
        Ok(written) => written,
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&dest).await {
                warn!(error = %cleanup, "Failed to remove partial download");
            }
            return Err(e);
        },
    };

    println!(
        "{} Saved {} ({} bytes)",
        "✓".green(),
        dest.display().to_string().bold(),
        written
    );
    Ok(())
}

async fn write_body(response: Response, dest: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}

/// File name from a `Content-Disposition` value. The RFC 5987 `filename*`
/// form wins over the plain one. Only the final path component is kept.
pub fn file_name_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in value.split(';').map(str::trim) {
        let Some((name, raw)) = param.split_once('=') else {
            continue;
        };

        match name.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let raw = raw.trim();
                let encoded = raw
                    .get(..7)
                    .filter(|charset| charset.eq_ignore_ascii_case("UTF-8''"))
                    .map_or(raw, |_| &raw[7..]);
                extended = urlencoding::decode(encoded).ok().map(|s| s.into_owned());
            },
            "filename" => {
                plain = Some(raw.trim().trim_matches('"').to_string());
            },
            _ => {},
        }
    }

    extended.or(plain).and_then(|name| safe_file_name(&name))
}

fn safe_file_name(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    let last = Path::new(&normalized).file_name()?.to_string_lossy().into_owned();

    if last.trim().is_empty() {
        None
    } else {
        Some(last)
    }
}

/// `output` names a directory to save into or the target file itself.
pub fn resolve_destination(output: Option<&Path>, suggested: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(suggested),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(suggested),
    }
}
