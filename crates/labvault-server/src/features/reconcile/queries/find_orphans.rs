use labvault_common::types::OrphanReport;
use serde::Deserialize;
use std::collections::HashSet;

use crate::db::{Catalog, CatalogError};
use crate::storage::{ObjectStore, StorageError};

pub const DEFAULT_SCAN_LIMIT: usize = 1000;
pub const MAX_SCAN_LIMIT: usize = 10_000;

/// Keys sent to the catalog per lookup.
const LOOKUP_BATCH: usize = 500;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FindOrphansQuery {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum FindOrphansError {
    #[error("limit must be between 1 and {}", MAX_SCAN_LIMIT)]
    InvalidLimit,
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl FindOrphansQuery {
    pub fn validate(&self) -> Result<(), FindOrphansError> {
        match self.limit {
            Some(limit) if limit == 0 || limit > MAX_SCAN_LIMIT => {
                Err(FindOrphansError::InvalidLimit)
            },
            _ => Ok(()),
        }
    }
}

/// Scan up to `limit` keys under `prefix` and report those no catalog row
/// references, in listing order.
#[tracing::instrument(skip(objects, catalog))]
pub async fn handle(
    objects: &dyn ObjectStore,
    catalog: &dyn Catalog,
    bucket: &str,
    query: FindOrphansQuery,
) -> Result<OrphanReport, FindOrphansError> {
    query.validate()?;

    let prefix = query.prefix.unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_SCAN_LIMIT);

    let keys = objects.list(bucket, &prefix, limit).await?;

    let mut referenced = HashSet::with_capacity(keys.len());
    for batch in keys.chunks(LOOKUP_BATCH) {
        referenced.extend(catalog.referenced_keys(bucket, batch).await?);
    }

    let orphans: Vec<String> = keys
        .iter()
        .filter(|key| !referenced.contains(*key))
        .cloned()
        .collect();

    if !orphans.is_empty() {
        tracing::warn!(count = orphans.len(), bucket, "Found objects with no catalog row");
    }

    Ok(OrphanReport {
        bucket: bucket.to_string(),
        prefix,
        scanned: keys.len(),
        orphans,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_bounds() {
        assert!(FindOrphansQuery::default().validate().is_ok());

        let query = FindOrphansQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = FindOrphansQuery {
            limit: Some(MAX_SCAN_LIMIT + 1),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }
}
