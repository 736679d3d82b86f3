//! Catalog database: connection settings, pool creation and migrations

pub mod catalog;

pub use catalog::{Catalog, CatalogError, CatalogResult, FileLocation, PgCatalog};

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::parse_env;
use crate::error::ConfigError;

/// Default host of the catalog database in the reference deployment.
pub const DEFAULT_PG_HOST: &str = "postgres-metadata-db";

pub const DEFAULT_PG_PORT: u16 = 5432;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Database configuration error: {0}. Set DATABASE_URL or PG_HOST, PG_DATABASE, PG_USER and PG_PASSWORD.")]
    Config(#[from] ConfigError),

    #[error("Database migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub connect_options: PgConnectOptions,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: Option<u64>,
    pub max_lifetime_secs: Option<u64>,
}

impl DbConfig {
    /// `DATABASE_URL` wins when set. Otherwise the target is assembled from
    /// `PG_HOST`, `PG_PORT`, `PG_DATABASE`, `PG_USER` and `PG_PASSWORD`, the
    /// last three being required.
    pub fn from_env() -> DbResult<Self> {
        let connect_options = match std::env::var("DATABASE_URL") {
            Ok(url) => PgConnectOptions::from_str(&url)
                .map_err(|e| ConfigError::invalid("DATABASE_URL", e.to_string()))?,
            Err(_) => PgConnectOptions::new()
                .host(&std::env::var("PG_HOST").unwrap_or_else(|_| DEFAULT_PG_HOST.to_string()))
                .port(parse_env("PG_PORT", DEFAULT_PG_PORT)?)
                .database(&required("PG_DATABASE")?)
                .username(&required("PG_USER")?)
                .password(&required("PG_PASSWORD")?),
        };

        Ok(Self {
            connect_options,
            max_connections: parse_env("DB_MAX_CONNECTIONS", 10)?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", 1)?,
            connect_timeout_secs: parse_env("DB_CONNECT_TIMEOUT", 10)?,
            idle_timeout_secs: optional("DB_IDLE_TIMEOUT")?,
            max_lifetime_secs: optional("DB_MAX_LIFETIME")?,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn optional(key: &'static str) -> Result<Option<u64>, ConfigError> {
    std::env::var(key)
        .ok()
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConfigError::invalid(key, e.to_string()))
        })
        .transpose()
}

pub async fn create_pool(config: &DbConfig) -> DbResult<PgPool> {
    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs));

    if let Some(idle_timeout) = config.idle_timeout_secs {
        options = options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime_secs {
        options = options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = options.connect_with(config.connect_options.clone()).await?;

    tracing::info!(
        host = config.connect_options.get_host(),
        database = config.connect_options.get_database().unwrap_or_default(),
        max_connections = config.max_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply the embedded catalog schema migrations.
pub async fn run_migrations(pool: &PgPool) -> DbResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}
