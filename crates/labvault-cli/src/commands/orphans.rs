use crate::api::ApiClient;
use crate::error::Result;
use colored::Colorize;

pub async fn run(
    server_url: String,
    prefix: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let client = ApiClient::new(server_url)?;
    let report = client.orphans(prefix.as_deref(), limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let scope = if report.prefix.is_empty() {
        String::new()
    } else {
        format!(" under '{}'", report.prefix)
    };
    println!(
        "Scanned {} object(s) in bucket {}{}",
        report.scanned,
        report.bucket.bold(),
        scope
    );

    if report.orphans.is_empty() {
        println!("{} No orphaned objects found.", "✓".green());
        return Ok(());
    }

    println!("{} {} object(s) have no catalog row:", "!".yellow(), report.orphans.len());
    for key in &report.orphans {
        println!("    {}", key);
    }
    Ok(())
}
