//! HTTP protocol layer module
//!
//! Body types, response builders, Range parsing and conditional requests,
//! independent of the file operations that use them.

pub mod body;
pub mod cache;
pub mod range;
pub mod response;

pub use body::{boxed_request_body, RequestBody, ResponseBody};
pub use response::{
    build_304_response, build_400_response, build_404_response, build_405_response,
    build_416_response, build_500_response, build_error_response, build_json_response,
};
