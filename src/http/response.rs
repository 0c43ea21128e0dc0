//! HTTP response building module
//!
//! Builders for JSON documents and the uniform `{"error": ...}` envelope.

use hyper::header::{HeaderValue, ALLOW, CONTENT_RANGE, CONTENT_TYPE, LAST_MODIFIED};
use hyper::{Method, Response, StatusCode};
use serde::Serialize;

use super::body::ResponseBody;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Public error messages. Clients only ever see one of these.
pub const ERR_BAD_REQUEST: &str = "Bad request";
pub const ERR_INTERNAL: &str = "Internal server error";
pub const ERR_NOT_FOUND: &str = "State not found";
pub const ERR_METHOD_NOT_ALLOWED: &str = "Method Not Allowed";

/// Fallback body when even the envelope cannot be serialized
const INTERNAL_ENVELOPE: &str = r#"{"error":"Internal server error"}"#;

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: &'a str,
}

/// Serialize `payload` into a JSON response with the given status
pub fn build_json_response<T: Serialize>(
    status: StatusCode,
    payload: &T,
) -> Result<Response<ResponseBody>, serde_json::Error> {
    let json = serde_json::to_vec(payload)?;
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .body(ResponseBody::from_bytes(json))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            internal_error_fallback()
        }))
}

/// Build the error envelope response
pub fn build_error_response(status: StatusCode, message: &str) -> Response<ResponseBody> {
    build_json_response(status, &ErrorEnvelope { error: message }).unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to serialize error envelope: {e}"));
        internal_error_fallback()
    })
}

/// Build 304 Not Modified response with an empty body
pub fn build_304_response(last_modified: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, last_modified)
        .body(ResponseBody::Empty)
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::NOT_MODIFIED, &e);
            internal_error_fallback()
        })
}

pub fn build_400_response() -> Response<ResponseBody> {
    build_error_response(StatusCode::BAD_REQUEST, ERR_BAD_REQUEST)
}

pub fn build_404_response() -> Response<ResponseBody> {
    build_error_response(StatusCode::NOT_FOUND, ERR_NOT_FOUND)
}

pub fn build_500_response() -> Response<ResponseBody> {
    build_error_response(StatusCode::INTERNAL_SERVER_ERROR, ERR_INTERNAL)
}

/// Build 405 Method Not Allowed response advertising the accepted method
pub fn build_405_response(allowed: &Method) -> Response<ResponseBody> {
    let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED, ERR_METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_RANGE, format!("bytes */{file_size}"))
        .body(ResponseBody::Empty)
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::RANGE_NOT_SATISFIABLE, &e);
            internal_error_fallback()
        })
}

fn internal_error_fallback() -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::from_bytes(INTERNAL_ENVELOPE));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
