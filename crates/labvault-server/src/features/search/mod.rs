pub mod queries;
pub mod routes;

pub use queries::{SearchFilesError, SearchFilesResponse};

pub use routes::search_routes;
