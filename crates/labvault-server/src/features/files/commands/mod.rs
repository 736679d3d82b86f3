pub mod upload;
pub mod upload_folder;

pub use upload::{UploadFileCommand, UploadFileError};
pub use upload_folder::{UploadFolderCommand, UploadFolderError};
