use serde::Serialize;
use std::env;

use crate::config::parse_env;
use crate::error::ConfigError;

pub const DEFAULT_MINIO_ENDPOINT: &str = "minio-server:9000";
pub const DEFAULT_BUCKET: &str = "raw-data";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Object store connection settings.
#[derive(Clone, Serialize)]
pub struct StorageConfig {
    /// Full endpoint URL including scheme
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    #[serde(skip)]
    pub secret_key: String,
    pub path_style: bool,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("path_style", &self.path_style)
            .finish()
    }
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let use_https = parse_env("MINIO_USE_HTTPS", false)?;
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| DEFAULT_MINIO_ENDPOINT.to_string());

        Ok(Self {
            endpoint: endpoint_url(&endpoint, use_https),
            region: env::var("MINIO_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            bucket: env::var("MINIO_DEFAULT_BUCKET").unwrap_or_else(|_| DEFAULT_BUCKET.to_string()),
            access_key: required("MINIO_ACCESS_KEY")?,
            secret_key: required("MINIO_SECRET_KEY")?,
            path_style: true,
        })
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: DEFAULT_REGION.to_string(),
            bucket: bucket.into(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            path_style: true,
        }
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

/// Add a scheme to a bare `host:port` endpoint.
fn endpoint_url(endpoint: &str, use_https: bool) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if use_https {
        format!("https://{}", endpoint)
    } else {
        format!("http://{}", endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_minio_env() {
        for key in [
            "MINIO_ENDPOINT",
            "MINIO_ACCESS_KEY",
            "MINIO_SECRET_KEY",
            "MINIO_DEFAULT_BUCKET",
            "MINIO_USE_HTTPS",
            "MINIO_REGION",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(endpoint_url("minio:9000", false), "http://minio:9000");
        assert_eq!(endpoint_url("minio:9000", true), "https://minio:9000");
        assert_eq!(endpoint_url("http://minio:9000", true), "http://minio:9000");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_minio_env();
        env::set_var("MINIO_ACCESS_KEY", "lab");
        env::set_var("MINIO_SECRET_KEY", "secret");

        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "http://minio-server:9000");
        assert_eq!(config.bucket, "raw-data");
        assert_eq!(config.region, "us-east-1");
        assert!(config.path_style);
        assert!(!format!("{:?}", config).contains("secret"));

        clear_minio_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_secret() {
        clear_minio_env();
        env::set_var("MINIO_ACCESS_KEY", "lab");

        assert!(matches!(
            StorageConfig::from_env(),
            Err(ConfigError::Missing("MINIO_SECRET_KEY"))
        ));

        clear_minio_env();
    }
}
