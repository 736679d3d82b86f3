//! LabVault Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Types shared between the LabVault gateway and its command-line client.
//!
//! # Overview
//!
//! - **Types**: catalog records, ingestion outcomes and search filters as they
//!   travel over the wire
//! - **Logging**: `tracing` subscriber setup driven by `LOG_*` variables
//! - **Errors**: validation errors raised while building shared types
//!
//! # Example
//!
//! ```no_run
//! use labvault_common::types::SearchFilters;
//!
//! let filters = SearchFilters {
//!     project_id: Some("neuro-1".to_string()),
//!     ..Default::default()
//! };
//! assert!(filters.validate().is_ok());
//! ```

pub mod error;
pub mod logging;
pub mod types;

pub use error::{LabvaultError, Result};
