//! Feature slices implementing the gateway API
//!
//! Each feature is a vertical slice: write operations live in `commands/`,
//! read operations in `queries/`, and `routes.rs` maps them onto HTTP.
//!
//! # Features
//!
//! - **files**: single-file upload, folder (ZIP) upload and streamed download
//! - **search**: filtered catalog search
//! - **reconcile**: read-only report of stored objects with no catalog row

pub mod files;
pub mod reconcile;
pub mod search;
pub mod shared;

use axum::Router;
use std::sync::Arc;

use crate::db::Catalog;
use crate::ingest::IngestPipeline;
use crate::storage::ObjectStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub objects: Arc<dyn ObjectStore>,
    pub catalog: Arc<dyn Catalog>,
    pub pipeline: IngestPipeline,
}

impl FeatureState {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        catalog: Arc<dyn Catalog>,
        bucket: impl Into<String>,
    ) -> Self {
        let pipeline = IngestPipeline::new(objects.clone(), catalog.clone(), bucket);
        Self {
            objects,
            catalog,
            pipeline,
        }
    }

    /// Default bucket all uploads are written to
    pub fn bucket(&self) -> &str {
        self.pipeline.bucket()
    }
}

/// All feature routes, mounted at the root
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(files::files_routes())
        .merge(search::search_routes())
        .nest("/admin", reconcile::reconcile_routes())
        .with_state(state)
}
