//! Shared utilities for feature modules

pub mod multipart;

pub use multipart::{read_upload_form, FormError, SpooledFile, UploadForm};
