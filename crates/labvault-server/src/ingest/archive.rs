//! ZIP expansion for folder uploads
//!
//! Blocking code. Callers on the async runtime wrap it in `spawn_blocking`.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const ARCHIVE_METADATA_DIR: &str = "__MACOSX";
const APPLE_DOUBLE_PREFIX: &str = "._";
const FINDER_METADATA: &str = ".DS_Store";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("The uploaded file is not a valid ZIP archive.")]
    Invalid(#[from] zip::result::ZipError),

    #[error("The uploaded file is not a valid ZIP archive.")]
    Corrupt {
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stage archive contents: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to enumerate archive contents: {0}")]
    Walk(#[from] walkdir::Error),
}

impl ArchiveError {
    /// Whether the uploader sent something that is not a readable archive,
    /// as opposed to a local staging failure.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ArchiveError::Invalid(_) | ArchiveError::Corrupt { .. })
    }
}

/// A regular file extracted from an uploaded archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    /// Final path component, as the uploader named it
    pub file_name: String,
    pub size_bytes: u64,
}

/// Extract `archive_path` into `dest` and list the files to ingest, in
/// name-sorted traversal order.
///
/// Entries whose names would escape `dest` are skipped. Archive metadata
/// artifacts and nested archives are not listed.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(File::open(archive_path)?)?;
    fs::create_dir_all(dest)?;

    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;

        let Some(relative) = file.enclosed_name() else {
            warn!(entry = file.name(), "Skipping archive entry with unsafe path");
            continue;
        };
        let target = dest.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&target)?;
        io::copy(&mut file, &mut out).map_err(|source| ArchiveError::Corrupt {
            entry: file.name().to_string(),
            source,
        })?;
    }

    let mut entries = Vec::new();
    let walker = WalkDir::new(dest)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_archive_metadata_dir(entry));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if is_skipped_file(&file_name) {
            debug!(file = %file_name, "Skipping archive artifact");
            continue;
        }

        entries.push(ArchiveEntry {
            size_bytes: entry.metadata()?.len(),
            path: entry.into_path(),
            file_name,
        });
    }

    Ok(entries)
}

fn is_archive_metadata_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_string_lossy()
            .starts_with(ARCHIVE_METADATA_DIR)
}

fn is_skipped_file(file_name: &str) -> bool {
    file_name.starts_with(ARCHIVE_METADATA_DIR)
        || file_name.starts_with(APPLE_DOUBLE_PREFIX)
        || file_name == FINDER_METADATA
        || file_name.to_ascii_lowercase().ends_with(".zip")
}
