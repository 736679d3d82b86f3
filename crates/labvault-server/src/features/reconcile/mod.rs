//! Orphan reconciliation
//!
//! An object whose catalog write failed stays in the bucket with no row
//! pointing at it. This slice reports such objects; it never deletes.

pub mod queries;
pub mod routes;

pub use queries::{FindOrphansError, FindOrphansQuery};

pub use routes::reconcile_routes;
