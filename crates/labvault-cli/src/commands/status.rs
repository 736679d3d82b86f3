use crate::api::ApiClient;
use crate::error::{CliError, Result};
use colored::Colorize;

pub async fn run(server_url: String) -> Result<()> {
    let client = ApiClient::new(server_url)?;

    let status = client.status().await?;
    println!("{} {} ({})", "Gateway:".bold(), status.message, client.base_url());

    let health = client.health().await?;
    if health.is_healthy() {
        println!("{} {}", "Catalog:".bold(), health.database.green());
        Ok(())
    } else {
        println!("{} {}", "Catalog:".bold(), health.database.red());
        Err(CliError::Api {
            status: 503,
            code: "CATALOG_UNAVAILABLE".to_string(),
            message: health.database,
        })
    }
}
