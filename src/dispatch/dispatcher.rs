//! Generic request pipeline
//!
//! method check → blank request → decode → handler → encode. Every failure is
//! turned into a response here; handlers never write to the wire themselves.

use std::future::Future;

use hyper::{Method, Response};

use super::error::OperationError;
use super::request::{DecodeRequest, RawRequest};
use super::response::EncodeResponse;
use crate::http::{self, ResponseBody};
use crate::storage::UploadRoot;

/// Run one request through the typed pipeline
///
/// `Req` and `Resp` fix the shapes of the operation; `handler` is the
/// operation itself. No state survives the call.
pub async fn dispatch<Req, Resp, F, Fut>(
    expected: &Method,
    raw: RawRequest,
    root: &UploadRoot,
    handler: F,
) -> Response<ResponseBody>
where
    Req: DecodeRequest,
    Resp: EncodeResponse,
    F: FnOnce(Req) -> Fut,
    Fut: Future<Output = Result<Resp, OperationError>>,
{
    if raw.head.method != *expected {
        tracing::debug!(
            method = %raw.head.method,
            expected = %expected,
            path = raw.head.uri.path(),
            "method not allowed"
        );
        return http::build_405_response(expected);
    }

    let mut request = Req::default();
    if let Err(e) = request.decode(raw, root) {
        tracing::warn!(error = %e, "rejecting undecodable request");
        return http::build_400_response();
    }

    let output = match handler(request).await {
        Ok(output) => output,
        Err(e) => {
            log_operation_error(&e);
            return http::build_error_response(e.status_code(), e.public_message());
        }
    };

    match output.encode().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response");
            http::build_500_response()
        }
    }
}

fn log_operation_error(err: &OperationError) {
    match err {
        OperationError::NotFound(_) => tracing::debug!(error = %err, "operation failed"),
        OperationError::BadRequest(_) => tracing::warn!(error = %err, "operation failed"),
        OperationError::Internal(_) => tracing::error!(error = %err, "operation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::request::ViewFileRequest;
    use crate::dispatch::response::FileListResult;
    use crate::http::boxed_request_body;
    use crate::routing::RoutePattern;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Bytes;
    use hyper::StatusCode;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn raw(method: Method, uri: &str) -> RawRequest {
        let params = RoutePattern::parse("/file/{name}")
            .match_path(uri)
            .unwrap_or_default();
        let request = hyper::Request::builder()
            .method(method)
            .uri(uri)
            .body(boxed_request_body(Full::new(Bytes::new())))
            .unwrap();
        RawRequest::new(request, params)
    }

    async fn error_message(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        json["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_wrong_method_skips_handler() {
        let root = UploadRoot::new("uploads");
        let called = AtomicBool::new(false);

        let request = raw(Method::POST, "/file/a");
        let response = dispatch(&Method::GET, request, &root, |_req: ViewFileRequest| {
            called.store(true, Ordering::SeqCst);
            async { Ok(FileListResult { files: vec![] }) }
        })
        .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(error_message(response).await, "Method Not Allowed");
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_decode_failure_short_circuits() {
        let root = UploadRoot::new("uploads");
        let called = AtomicBool::new(false);

        let request = raw(Method::GET, "/file/..");
        let response = dispatch(&Method::GET, request, &root, |_req: ViewFileRequest| {
            called.store(true, Ordering::SeqCst);
            async { Ok(FileListResult { files: vec![] }) }
        })
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_message(response).await, "Bad request");
        assert!(!called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_handler_error_maps_to_envelope() {
        let root = UploadRoot::new("uploads");
        let request = raw(Method::GET, "/file/a");
        let response = dispatch(&Method::GET, request, &root, |req: ViewFileRequest| async move {
            Err::<FileListResult, _>(OperationError::NotFound(req.name))
        })
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_message(response).await, "State not found");
    }

    #[tokio::test]
    async fn test_handler_receives_decoded_request() {
        let root = UploadRoot::new("uploads");
        let request = raw(Method::GET, "/file/a.txt");
        let response = dispatch(&Method::GET, request, &root, |req: ViewFileRequest| async move {
            Ok(FileListResult {
                files: vec![req.name, req.path.display().to_string()],
            })
        })
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json, serde_json::json!({"files": ["a.txt", "uploads/a.txt"]}));
    }
}
