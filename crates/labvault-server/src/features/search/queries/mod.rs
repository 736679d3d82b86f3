pub mod search_files;

pub use search_files::{SearchFilesError, SearchFilesResponse};
