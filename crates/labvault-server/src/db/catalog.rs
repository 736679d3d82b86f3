//! Catalog store: the relational index of stored objects
//!
//! The [`Catalog`] trait is what the ingestion pipeline and the request
//! handlers depend on. [`PgCatalog`] is the PostgreSQL implementation backed
//! by `file_index.files_metadata_catalog`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use labvault_common::types::{FileRecord, SearchFilters};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

const SELECT_RECORDS: &str = "SELECT file_id, project_id, file_name, file_type, content_type, \
     experiment_type, author, date_conducted, size_bytes, storage_bucket, storage_key, \
     upload_timestamp, custom_tags FROM file_index.files_metadata_catalog";

/// Catalog failures, split by whether the backend could be reached at all.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Database Connection Error: {0}")]
    Connection(String),

    /// The statement reached the database and was rejected; the transaction
    /// was rolled back.
    #[error("Database operational error: {0}")]
    Operation(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => CatalogError::Connection(err.to_string()),
            other => CatalogError::Operation(other.to_string()),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Where a catalogued object lives, enough to stream it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLocation {
    pub bucket: String,
    pub key: String,
    pub file_name: String,
    pub content_type: String,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Insert one row. Either the whole row is committed or nothing is.
    async fn insert(&self, record: &FileRecord) -> CatalogResult<()>;

    /// Rows matching every given predicate, newest upload first.
    async fn search(&self, filters: &SearchFilters) -> CatalogResult<Vec<FileRecord>>;

    async fn lookup_location(&self, file_id: Uuid) -> CatalogResult<Option<FileLocation>>;

    /// The subset of `keys` in `bucket` that some row points at.
    async fn referenced_keys(&self, bucket: &str, keys: &[String])
        -> CatalogResult<HashSet<String>>;

    async fn ping(&self) -> CatalogResult<()>;
}

#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    file_id: Uuid,
    project_id: String,
    file_name: String,
    file_type: String,
    content_type: String,
    experiment_type: Option<String>,
    author: Option<String>,
    date_conducted: Option<NaiveDate>,
    size_bytes: i64,
    storage_bucket: String,
    storage_key: String,
    upload_timestamp: DateTime<Utc>,
    custom_tags: Option<String>,
}

impl From<CatalogRow> for FileRecord {
    fn from(row: CatalogRow) -> Self {
        Self {
            file_id: row.file_id,
            project_id: row.project_id,
            file_name: row.file_name,
            file_type: row.file_type,
            content_type: row.content_type,
            experiment_type: row.experiment_type,
            author: row.author,
            date_conducted: row.date_conducted,
            size_bytes: row.size_bytes,
            storage_bucket: row.storage_bucket,
            storage_key: row.storage_key,
            upload_timestamp: row.upload_timestamp,
            custom_tags: row.custom_tags,
        }
    }
}

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PgCatalog {
    #[instrument(skip(self, record), fields(file_id = %record.file_id, storage_key = %record.storage_key))]
    async fn insert(&self, record: &FileRecord) -> CatalogResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO file_index.files_metadata_catalog (
                file_id, project_id, file_name, file_type, content_type,
                experiment_type, author, date_conducted, size_bytes,
                storage_bucket, storage_key, upload_timestamp, custom_tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.file_id)
        .bind(&record.project_id)
        .bind(&record.file_name)
        .bind(&record.file_type)
        .bind(&record.content_type)
        .bind(&record.experiment_type)
        .bind(&record.author)
        .bind(record.date_conducted)
        .bind(record.size_bytes)
        .bind(&record.storage_bucket)
        .bind(&record.storage_key)
        .bind(record.upload_timestamp)
        .bind(&record.custom_tags)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!("Catalog row committed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn search(&self, filters: &SearchFilters) -> CatalogResult<Vec<FileRecord>> {
        let mut query = build_search_query(filters);
        debug!(sql = %query.sql(), "Executing catalog search");

        let rows: Vec<CatalogRow> = query.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(FileRecord::from).collect())
    }

    #[instrument(skip(self))]
    async fn lookup_location(&self, file_id: Uuid) -> CatalogResult<Option<FileLocation>> {
        let row: Option<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT storage_bucket, storage_key, file_name, content_type
            FROM file_index.files_metadata_catalog
            WHERE file_id = $1
            "#,
        )
        .bind(file_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(bucket, key, file_name, content_type)| FileLocation {
            bucket,
            key,
            file_name,
            content_type,
        }))
    }

    #[instrument(skip(self, keys), fields(key_count = keys.len()))]
    async fn referenced_keys(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> CatalogResult<HashSet<String>> {
        if keys.is_empty() {
            return Ok(HashSet::new());
        }

        let referenced: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT storage_key
            FROM file_index.files_metadata_catalog
            WHERE storage_bucket = $1 AND storage_key = ANY($2)
            "#,
        )
        .bind(bucket)
        .bind(keys)
        .fetch_all(&self.pool)
        .await?;

        Ok(referenced.into_iter().collect())
    }

    async fn ping(&self) -> CatalogResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Build the filtered search statement. Every user value is a bind parameter.
pub(crate) fn build_search_query(filters: &SearchFilters) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(SELECT_RECORDS);
    let mut has_where = false;

    if let Some(file_id) = filters.file_id {
        push_predicate(&mut query, &mut has_where);
        query.push("file_id = ").push_bind(file_id);
    }

    let text_predicates = [
        ("project_id", &filters.project_id),
        ("author", &filters.author),
        ("file_type", &filters.file_type),
        ("experiment_type", &filters.experiment_type),
        ("custom_tags", &filters.tags_contain),
    ];

    for (column, value) in text_predicates {
        if let Some(value) = SearchFilters::text(value) {
            push_predicate(&mut query, &mut has_where);
            query
                .push(column)
                .push(" ILIKE ")
                .push_bind(format!("%{}%", escape_like(value)));
        }
    }

    if let Some(after) = filters.date_after {
        push_predicate(&mut query, &mut has_where);
        query.push("date_conducted >= ").push_bind(after);
    }

    if let Some(before) = filters.date_before {
        push_predicate(&mut query, &mut has_where);
        query.push("date_conducted <= ").push_bind(before);
    }

    query
        .push(" ORDER BY upload_timestamp DESC LIMIT ")
        .push_bind(i64::from(filters.effective_limit()));

    query
}

fn push_predicate(query: &mut QueryBuilder<'static, Postgres>, has_where: &mut bool) {
    query.push(if *has_where { " AND " } else { " WHERE " });
    *has_where = true;
}

/// Escape `LIKE` metacharacters so user input matches literally.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfiltered_search_is_ordered_and_capped() {
        let query = build_search_query(&SearchFilters::default());
        let sql = query.sql();

        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with(" ORDER BY upload_timestamp DESC LIMIT $1"));
    }

    #[test]
    fn test_predicates_are_bound_in_order() {
        let filters = SearchFilters {
            file_id: Some(Uuid::nil()),
            project_id: Some("neuro-1".to_string()),
            author: Some("   ".to_string()),
            tags_contain: Some("eeg".to_string()),
            date_after: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };

        let query = build_search_query(&filters);
        let sql = query.sql();

        assert!(sql.contains(
            " WHERE file_id = $1 AND project_id ILIKE $2 AND custom_tags ILIKE $3 \
             AND date_conducted >= $4 ORDER BY upload_timestamp DESC LIMIT $5"
        ));
        assert!(!sql.contains("author"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_sqlx_error_classification() {
        assert!(matches!(
            CatalogError::from(sqlx::Error::PoolTimedOut),
            CatalogError::Connection(_)
        ));
        assert!(matches!(
            CatalogError::from(sqlx::Error::RowNotFound),
            CatalogError::Operation(_)
        ));
    }
}
