use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use labvault_common::types::SearchFilters;
use serde_json::json;

use super::queries::SearchFilesError;
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn search_routes() -> Router<FeatureState> {
    Router::new().route("/search", get(search_files))
}

#[tracing::instrument(skip(state, filters))]
async fn search_files(
    State(state): State<FeatureState>,
    filters: Result<Query<SearchFilters>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(filters) = filters.map_err(|e| AppError::Validation(e.body_text()))?;

    let response = super::queries::search_files::handle(state.catalog.as_ref(), filters).await?;

    tracing::debug!(count = response.items.len(), "Search completed");

    let meta = json!({
        "count": response.items.len(),
        "limit": response.limit,
    });

    Ok(ApiResponse::success_with_meta(response.items, meta).into_response())
}

impl From<SearchFilesError> for AppError {
    fn from(err: SearchFilesError) -> Self {
        match err {
            SearchFilesError::Invalid(e) => AppError::Validation(e.to_string()),
            SearchFilesError::Catalog(e) => e.into(),
        }
    }
}
