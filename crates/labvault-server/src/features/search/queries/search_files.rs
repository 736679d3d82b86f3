use labvault_common::types::{FileRecord, SearchFilters};
use labvault_common::LabvaultError;

use crate::db::{Catalog, CatalogError};

#[derive(Debug, Clone)]
pub struct SearchFilesResponse {
    pub items: Vec<FileRecord>,
    pub limit: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SearchFilesError {
    #[error(transparent)]
    Invalid(#[from] LabvaultError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[tracing::instrument(skip(catalog))]
pub async fn handle(
    catalog: &dyn Catalog,
    filters: SearchFilters,
) -> Result<SearchFilesResponse, SearchFilesError> {
    filters.validate()?;

    let items = catalog.search(&filters).await?;

    Ok(SearchFilesResponse {
        items,
        limit: filters.effective_limit(),
    })
}
