//! Typed request/response dispatch
//!
//! Turns a raw request into a typed operation input, runs the operation and
//! turns its typed output back into a response.

mod dispatcher;
pub mod error;
pub mod request;
pub mod response;

pub use dispatcher::dispatch;
pub use error::{DecodeError, EncodeError, OperationError};
pub use request::{
    DecodeRequest, DownloadFileRequest, ListFilesRequest, RawRequest, UploadFileRequest,
    ViewFileRequest,
};
pub use response::{DownloadStream, EncodeResponse, FileListResult, FileMetadata, UploadResult};
