use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

use super::config::StorageConfig;
use super::{ObjectStore, ObjectStream, Payload, StorageError, StorageResult};

/// Upper bound for a single listing page.
const LIST_PAGE_SIZE: usize = 1000;

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        debug!("Initializing object store with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "labvault-storage",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .force_path_style(config.path_style)
            .build();

        info!(endpoint = %config.endpoint, "Object store client initialized");

        Self {
            client: Client::from_conf(s3_config),
        }
    }

    /// Create `bucket` unless it already exists.
    #[instrument(skip(self))]
    pub async fn ensure_bucket(&self, bucket: &str) -> StorageResult<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!("Bucket '{}' already exists", bucket);
                Ok(())
            },
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => {
                self.client
                    .create_bucket()
                    .bucket(bucket)
                    .send()
                    .await
                    .map_err(transport)?;
                info!("Bucket '{}' created", bucket);
                Ok(())
            },
            Err(err) => Err(transport(err)),
        }
    }
}

fn transport<E>(err: E) -> StorageError
where
    E: std::error::Error,
{
    StorageError::Transport(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self))]
    async fn exists(&self, bucket: &str, key: &str) -> StorageResult<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(transport(err)),
        }
    }

    #[instrument(skip(self, payload))]
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: Payload,
        length: u64,
        content_type: &str,
    ) -> StorageResult<()> {
        let body = match payload {
            Payload::Bytes(bytes) => ByteStream::from(bytes),
            Payload::File(path) => ByteStream::from_path(&path).await.map_err(transport)?,
        };

        let length = i64::try_from(length)
            .map_err(|_| StorageError::Transport(format!("Object length {} is too large", length)))?;

        debug!("Uploading {} bytes to {}/{}", length, bucket, key);

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_length(length)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(transport)?;

        info!("Successfully uploaded {}/{}", bucket, key);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, bucket: &str, key: &str) -> StorageResult<ObjectStream> {
        let response = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(response) => response,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Err(StorageError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            },
            Err(err) => return Err(transport(err)),
        };

        Ok(Box::pin(ReaderStream::new(response.body.into_async_read())))
    }

    #[instrument(skip(self))]
    async fn list(&self, bucket: &str, prefix: &str, limit: usize) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        while keys.len() < limit {
            let page_size = (limit - keys.len()).min(LIST_PAGE_SIZE);
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .max_keys(i32::try_from(page_size).unwrap_or(i32::MAX))
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(transport)?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                },
                _ => break,
            }
        }

        keys.truncate(limit);
        debug!("Listed {} keys under {}/{}", keys.len(), bucket, prefix);
        Ok(keys)
    }
}
