pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{UploadFileCommand, UploadFileError, UploadFolderCommand, UploadFolderError};

pub use queries::{DownloadFileError, DownloadFileQuery, DownloadFileResponse};

pub use routes::files_routes;
