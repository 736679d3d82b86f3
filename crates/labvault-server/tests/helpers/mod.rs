//! Test helpers for LabVault server integration tests
//!
//! This module provides:
//! - In-memory `ObjectStore` and `Catalog` doubles
//! - A catalog that always fails, for partial-failure tests
//! - A router wired to the doubles
//! - A hand-rolled multipart body builder and a ZIP builder

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use futures::StreamExt;
use labvault_common::types::{FileRecord, SearchFilters};
use labvault_server::config::{Config, CorsConfig, ServerConfig, UploadConfig};
use labvault_server::db::{Catalog, CatalogError, CatalogResult, DbConfig, FileLocation};
use labvault_server::features::FeatureState;
use labvault_server::storage::config::StorageConfig;
use labvault_server::storage::{ObjectStore, ObjectStream, Payload, StorageError, StorageResult};
use sqlx::postgres::PgConnectOptions;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const TEST_BUCKET: &str = "raw-data";

// ============================================================================
// Object store double
// ============================================================================

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
    fail_writes: AtomicBool,
    fail_probes: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data: Bytes::copy_from_slice(data),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn remove(&self, bucket: &str, key: &str) {
        self.objects
            .lock()
            .unwrap()
            .remove(&(bucket.to_string(), key.to_string()));
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Make every existence check fail as if the store were unreachable.
    pub fn fail_probes(&self) {
        self.fail_probes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        if self.fail_probes.load(Ordering::SeqCst) {
            return Err(StorageError::Transport("connection refused".into()));
        }
        Ok(self.object(bucket, key).is_some())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: Payload,
        length: u64,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Transport("simulated write failure".into()));
        }

        let data = match payload {
            Payload::Bytes(bytes) => bytes,
            Payload::File(path) => Bytes::from(tokio::fs::read(path).await?),
        };
        assert_eq!(data.len() as u64, length, "declared length must match payload");

        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream> {
        let object = self.object(bucket, key).ok_or_else(|| StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })?;

        Ok(futures::stream::once(async move { Ok(object.data) }).boxed())
    }

    async fn list(&self, bucket: &str, prefix: &str, limit: usize) -> StorageResult<Vec<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .take(limit)
            .collect())
    }
}

// ============================================================================
// Catalog doubles
// ============================================================================

#[derive(Default)]
pub struct MemoryCatalog {
    rows: Mutex<Vec<FileRecord>>,
}

impl MemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rows(&self) -> Vec<FileRecord> {
        self.rows.lock().unwrap().clone()
    }
}

fn contains_ci(haystack: Option<&str>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => haystack
            .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
    }
}

fn matches(row: &FileRecord, filters: &SearchFilters) -> bool {
    filters.file_id.map_or(true, |id| row.file_id == id)
        && contains_ci(Some(row.project_id.as_str()), SearchFilters::text(&filters.project_id))
        && contains_ci(row.author.as_deref(), SearchFilters::text(&filters.author))
        && contains_ci(Some(row.file_type.as_str()), SearchFilters::text(&filters.file_type))
        && contains_ci(
            row.experiment_type.as_deref(),
            SearchFilters::text(&filters.experiment_type),
        )
        && contains_ci(row.custom_tags.as_deref(), SearchFilters::text(&filters.tags_contain))
        && filters
            .date_after
            .map_or(true, |after| row.date_conducted.is_some_and(|d| d >= after))
        && filters
            .date_before
            .map_or(true, |before| row.date_conducted.is_some_and(|d| d <= before))
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn insert(&self, record: &FileRecord) -> CatalogResult<()> {
        self.rows.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn search(&self, filters: &SearchFilters) -> CatalogResult<Vec<FileRecord>> {
        let mut found: Vec<FileRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| matches(row, filters))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.upload_timestamp.cmp(&a.upload_timestamp));
        found.truncate(filters.effective_limit() as usize);
        Ok(found)
    }

    async fn lookup_location(&self, file_id: uuid::Uuid) -> CatalogResult<Option<FileLocation>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.file_id == file_id)
            .map(|row| FileLocation {
                bucket: row.storage_bucket.clone(),
                key: row.storage_key.clone(),
                file_name: row.file_name.clone(),
                content_type: row.content_type.clone(),
            }))
    }

    async fn referenced_keys(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> CatalogResult<HashSet<String>> {
        let wanted: HashSet<&String> = keys.iter().collect();
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.storage_bucket == bucket && wanted.contains(&row.storage_key))
            .map(|row| row.storage_key.clone())
            .collect())
    }

    async fn ping(&self) -> CatalogResult<()> {
        Ok(())
    }
}

/// A catalog whose backend is unreachable.
pub struct UnreachableCatalog;

fn refused() -> CatalogError {
    CatalogError::Connection("connection refused".to_string())
}

#[async_trait]
impl Catalog for UnreachableCatalog {
    async fn insert(&self, _record: &FileRecord) -> CatalogResult<()> {
        Err(refused())
    }

    async fn search(&self, _filters: &SearchFilters) -> CatalogResult<Vec<FileRecord>> {
        Err(refused())
    }

    async fn lookup_location(&self, _file_id: uuid::Uuid) -> CatalogResult<Option<FileLocation>> {
        Err(refused())
    }

    async fn referenced_keys(
        &self,
        _bucket: &str,
        _keys: &[String],
    ) -> CatalogResult<HashSet<String>> {
        Err(refused())
    }

    async fn ping(&self) -> CatalogResult<()> {
        Err(refused())
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            shutdown_timeout_secs: 1,
        },
        database: DbConfig {
            connect_options: PgConnectOptions::new(),
            max_connections: 1,
            min_connections: 0,
            connect_timeout_secs: 1,
            idle_timeout_secs: None,
            max_lifetime_secs: None,
        },
        storage: StorageConfig::for_minio("http://localhost:9000", TEST_BUCKET),
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
            allow_credentials: false,
        },
        upload: UploadConfig {
            max_body_bytes: 16 * 1024 * 1024,
        },
    }
}

pub fn test_app(objects: Arc<dyn ObjectStore>, catalog: Arc<dyn Catalog>) -> Router {
    let state = FeatureState::new(objects, catalog, TEST_BUCKET);
    labvault_server::api::create_router(state, &test_config())
}

// ============================================================================
// Request bodies
// ============================================================================

pub const BOUNDARY: &str = "labvault-test-boundary";

/// Minimal `multipart/form-data` body builder
#[derive(Default)]
pub struct MultipartBody {
    buf: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        write!(
            self.buf,
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .unwrap();
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        write!(self.buf, "--{BOUNDARY}--\r\n").unwrap();
        self.buf
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }
}

/// Build an in-memory ZIP archive.
pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
