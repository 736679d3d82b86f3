//! Object storage abstraction
//!
//! The gateway only needs four operations from its object store: an existence
//! probe, a sized write, a streamed read and a prefix listing.
//! [`s3::S3ObjectStore`] implements them against any S3-compatible endpoint.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use thiserror::Error;

pub mod config;
pub mod s3;

pub use s3::S3ObjectStore;

/// Object contents, streamed out of the store
pub type ObjectStream = Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send>>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Object {bucket}/{key} does not exist")]
    NotFound { bucket: String, key: String },

    #[error("Object store request failed: {0}")]
    Transport(String),

    #[error("Local I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Bytes to write, either already in memory or spooled to a local file.
#[derive(Debug, Clone)]
pub enum Payload {
    Bytes(Bytes),
    File(PathBuf),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool>;

    /// Write `length` bytes under `key`, replacing any existing object.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: Payload,
        length: u64,
        content_type: &str,
    ) -> StorageResult<()>;

    async fn get(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream>;

    /// Up to `limit` keys under `prefix`, in the store's listing order.
    async fn list(&self, bucket: &str, prefix: &str, limit: usize) -> StorageResult<Vec<String>>;
}
