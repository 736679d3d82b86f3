//! LabVault Server Library
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//!
//! Metadata-indexed object storage gateway for research data.
//!
//! # Overview
//!
//! Clients upload a file (or a ZIP of files) together with a YAML metadata
//! document. The gateway writes the bytes to an S3-compatible bucket, records a
//! catalog row in PostgreSQL, and later serves catalog searches and streamed
//! downloads by file id.
//!
//! - **ingest**: the upload-ingestion pipeline (sanitize, resolve a free key,
//!   write the object, write the catalog row)
//! - **storage**: object store trait and its S3/MinIO implementation
//! - **db**: catalog trait, its PostgreSQL implementation and migrations
//! - **features**: HTTP handlers as vertical slices
//! - **api**: router assembly, response envelopes and graceful shutdown
//!
//! # Ordering guarantee
//!
//! An object is always written before its catalog row. A catalog row therefore
//! never points at a key that was not written, while a failed catalog write
//! can leave an orphaned object. Orphans are reported by `GET /admin/orphans`.
//!
//! # Example
//!
//! ```no_run
//! use labvault_server::{api, config::Config, db, features::FeatureState, storage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let objects = storage::S3ObjectStore::new(&config.storage);
//!     let state = FeatureState::new(
//!         Arc::new(objects),
//!         Arc::new(db::PgCatalog::new(pool)),
//!         config.storage.bucket.clone(),
//!     );
//!     api::serve(state, &config).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod storage;

pub use error::{AppError, ConfigError};
