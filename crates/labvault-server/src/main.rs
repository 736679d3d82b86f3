//! LabVault Server - Main entry point

use anyhow::{Context, Result};
use labvault_common::logging::{init_logging, LogConfig};
use std::sync::Arc;
use tracing::info;

use labvault_server::{
    api,
    config::Config,
    db::{self, PgCatalog},
    features::FeatureState,
    storage::S3ObjectStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("labvault-server")
        .filter_directives("labvault_server=debug,tower_http=debug,sqlx=warn,aws_smithy_runtime=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting LabVault Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to the catalog database")?;

    db::run_migrations(&pool).await?;

    let objects = S3ObjectStore::new(&config.storage);
    objects
        .ensure_bucket(&config.storage.bucket)
        .await
        .with_context(|| format!("Failed to prepare bucket '{}'", config.storage.bucket))?;
    info!(bucket = %config.storage.bucket, "Object store ready");

    let state = FeatureState::new(
        Arc::new(objects),
        Arc::new(PgCatalog::new(pool)),
        config.storage.bucket.clone(),
    );

    api::serve(state, &config).await
}
