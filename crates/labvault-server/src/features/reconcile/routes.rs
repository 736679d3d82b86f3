use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use super::queries::{FindOrphansError, FindOrphansQuery};
use crate::api::response::ApiResponse;
use crate::error::AppError;
use crate::features::FeatureState;

pub fn reconcile_routes() -> Router<FeatureState> {
    Router::new().route("/orphans", get(find_orphans))
}

#[tracing::instrument(skip(state, query))]
async fn find_orphans(
    State(state): State<FeatureState>,
    query: Result<Query<FindOrphansQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let report = super::queries::find_orphans::handle(
        state.objects.as_ref(),
        state.catalog.as_ref(),
        state.bucket(),
        query,
    )
    .await?;

    Ok(ApiResponse::success(report).into_response())
}

impl From<FindOrphansError> for AppError {
    fn from(err: FindOrphansError) -> Self {
        match err {
            FindOrphansError::InvalidLimit => AppError::Validation(err.to_string()),
            FindOrphansError::Storage(e) => AppError::Storage(e.to_string()),
            FindOrphansError::Catalog(e) => e.into(),
        }
    }
}
