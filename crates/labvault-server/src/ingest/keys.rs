//! Unique key resolution

use tracing::debug;

use super::sanitize::split_extension;
use super::{IngestError, IngestResult};
use crate::storage::ObjectStore;

/// Highest counter tried before giving up on a desired key.
pub const MAX_KEY_ATTEMPTS: u32 = 1000;

/// A storage key as requested, before collision handling.
///
/// The segments are already sanitized. Empty prefixes are omitted from the
/// final key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredKey {
    pub project_prefix: String,
    pub folder_prefix: String,
    pub file_name: String,
}

impl DesiredKey {
    pub fn new(
        project_prefix: impl Into<String>,
        folder_prefix: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            project_prefix: project_prefix.into(),
            folder_prefix: folder_prefix.into(),
            file_name: file_name.into(),
        }
    }

    pub fn key(&self) -> String {
        self.join(&self.file_name)
    }

    /// Key with `(n)` inserted between base name and extension.
    pub fn with_counter(&self, counter: u32) -> String {
        let (base, ext) = split_extension(&self.file_name);
        self.join(&format!("{}({}){}", base, counter, ext))
    }

    fn join(&self, file_name: &str) -> String {
        let mut key = String::new();
        for prefix in [&self.project_prefix, &self.folder_prefix] {
            let prefix = prefix.trim_end_matches('/');
            if !prefix.is_empty() {
                key.push_str(prefix);
                key.push('/');
            }
        }
        key.push_str(file_name);
        key
    }
}

/// First key in `desired`, `desired(1)`, `desired(2)`, ... that does not exist
/// in `bucket` at probe time.
///
/// The probe and the later write are not atomic. Two concurrent uploads of the
/// same name can resolve to the same key and the later write wins.
pub async fn resolve_unique_key(
    store: &dyn ObjectStore,
    bucket: &str,
    desired: &DesiredKey,
) -> IngestResult<String> {
    let mut candidate = desired.key();

    for attempt in 1..=MAX_KEY_ATTEMPTS {
        let taken = store
            .exists(bucket, &candidate)
            .await
            .map_err(|source| IngestError::KeyProbe {
                key: candidate.clone(),
                source,
            })?;

        if !taken {
            return Ok(candidate);
        }

        debug!(attempt, key = %candidate, "Storage key taken, trying next counter");
        candidate = desired.with_counter(attempt);
    }

    Err(IngestError::NameSpaceExhausted {
        desired: desired.key(),
        attempts: MAX_KEY_ATTEMPTS,
    })
}
