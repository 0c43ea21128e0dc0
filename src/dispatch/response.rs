//! Response variants
//!
//! JSON results serialize themselves with status 200. `DownloadStream` is the
//! odd one out: it opens the file and hands it to the body as a byte stream.

use std::future::Future;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hyper::header::{
    HeaderName, HeaderValue, ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE,
    CONTENT_TYPE, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE, LAST_MODIFIED, RANGE,
};
use hyper::http::request::Parts;
use hyper::{Response, StatusCode};
use serde::Serialize;
use tokio::fs::File;
use tokio::io::AsyncSeekExt;

use super::error::EncodeError;
use crate::http::range::{parse_range_header, RangeParseResult};
use crate::http::cache::{http_date, if_range_matches, is_not_modified};
use crate::http::{build_304_response, build_416_response, build_json_response, ResponseBody};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully";

/// Typed operation output that knows how to become a wire response
pub trait EncodeResponse: Send {
    fn encode(self) -> impl Future<Output = Result<Response<ResponseBody>, EncodeError>> + Send;
}

/// `POST /upload` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    #[serde(rename = "msg")]
    pub message: String,
    #[serde(rename = "filePath")]
    pub stored_path: String,
}

impl UploadResult {
    pub fn stored(path: &Path) -> Self {
        Self {
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
            stored_path: path.display().to_string(),
        }
    }
}

/// `GET /files` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListResult {
    pub files: Vec<String>,
}

/// `GET /file/{name}` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    pub size_in_bytes: u64,
    /// RFC 3339, UTC, second precision
    pub mod_time: String,
}

macro_rules! impl_json_response {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl EncodeResponse for $ty {
                async fn encode(self) -> Result<Response<ResponseBody>, EncodeError> {
                    Ok(build_json_response(StatusCode::OK, &self)?)
                }
            }
        )+
    };
}

impl_json_response!(UploadResult, FileListResult, FileMetadata);

/// `GET /download/{name}` result: the file itself, streamed
#[derive(Debug)]
pub struct DownloadStream {
    pub file_name: String,
    pub path: PathBuf,
    pub head: Option<Parts>,
}

impl DownloadStream {
    fn header(&self, name: HeaderName) -> Option<&str> {
        self.head
            .as_ref()
            .and_then(|head| head.headers.get(name))
            .and_then(|v| v.to_str().ok())
    }
}

impl EncodeResponse for DownloadStream {
    async fn encode(self) -> Result<Response<ResponseBody>, EncodeError> {
        let mut file = File::open(&self.path).await?;
        let metadata = file.metadata().await?;
        let file_size = metadata.len();

        let modified: Option<DateTime<Utc>> = metadata.modified().ok().map(Into::into);

        if let Some(modified) = modified {
            let if_modified_since = self.header(IF_MODIFIED_SINCE);
            if is_not_modified(if_modified_since, self.header(IF_NONE_MATCH), modified) {
                tracing::debug!(file = %self.file_name, "download not modified");
                return Ok(build_304_response(&http_date(modified)));
            }
        }

        let mut builder = Response::builder()
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_DISPOSITION, content_disposition(&self.file_name))
            .header(ACCEPT_RANGES, "bytes");
        if let Some(modified) = modified {
            builder = builder.header(LAST_MODIFIED, http_date(modified));
        }

        // A stale If-Range validator downgrades the request to a full download
        let range = self
            .header(RANGE)
            .filter(|_| if_range_matches(self.header(IF_RANGE), modified));

        let response = match parse_range_header(range, file_size) {
            RangeParseResult::Satisfiable(range) => {
                file.seek(SeekFrom::Start(range.start)).await?;
                tracing::debug!(
                    file = %self.file_name,
                    start = range.start,
                    end = range.end,
                    "serving partial download"
                );
                builder
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(CONTENT_RANGE, range.content_range(file_size))
                    .header(CONTENT_LENGTH, range.length())
                    .body(ResponseBody::from_file(file, range.length()))?
            }
            RangeParseResult::NotSatisfiable => build_416_response(file_size),
            RangeParseResult::Ignored => builder
                .status(StatusCode::OK)
                .header(CONTENT_LENGTH, file_size)
                .body(ResponseBody::from_file(file, file_size))?,
        };
        Ok(response)
    }
}

/// `attachment; filename="<name>"` with quotes and backslashes escaped
fn content_disposition(file_name: &str) -> HeaderValue {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_bytes(format!("attachment; filename=\"{escaped}\"").as_bytes())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tokio::io::AsyncWriteExt;

    async fn body_bytes(response: Response<ResponseBody>) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    async fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).await.unwrap();
        file.write_all(contents).await.unwrap();
        file.flush().await.unwrap();
        path
    }

    fn download(path: PathBuf, name: &str, headers: &[(HeaderName, &str)]) -> DownloadStream {
        let mut builder = hyper::Request::builder().uri(format!("/download/{name}"));
        for (header, value) in headers {
            builder = builder.header(header, *value);
        }
        let (head, ()) = builder.body(()).unwrap().into_parts();
        DownloadStream {
            file_name: name.to_string(),
            path,
            head: Some(head),
        }
    }

    #[tokio::test]
    async fn test_upload_result_wire_format() {
        let response = UploadResult::stored(Path::new("uploads/a.txt"))
            .encode()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"msg": "File uploaded successfully", "filePath": "uploads/a.txt"})
        );
    }

    #[tokio::test]
    async fn test_metadata_wire_format() {
        let metadata = FileMetadata {
            name: "a.txt".into(),
            size_in_bytes: 123,
            mod_time: "2024-01-01T00:00:00Z".into(),
        };
        let response = metadata.encode().await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "a.txt",
                "sizeInBytes": 123,
                "modTime": "2024-01-01T00:00:00Z"
            })
        );
    }

    #[tokio::test]
    async fn test_download_full_body_and_headers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "a.bin", b"hello world").await;

        let response = download(path, "a.bin", &[]).encode().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "application/octet-stream");
        assert_eq!(headers[CONTENT_DISPOSITION], "attachment; filename=\"a.bin\"");
        assert_eq!(headers[CONTENT_LENGTH], "11");
        assert!(headers.contains_key(LAST_MODIFIED));
        assert_eq!(body_bytes(response).await, b"hello world");
    }

    #[tokio::test]
    async fn test_download_partial_range() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "a.bin", b"hello world").await;

        let response = download(path, "a.bin", &[(RANGE, "bytes=6-")])
            .encode()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes 6-10/11");
        assert_eq!(body_bytes(response).await, b"world");
    }

    #[tokio::test]
    async fn test_download_unsatisfiable_range() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "a.bin", b"abc").await;

        let response = download(path, "a.bin", &[(RANGE, "bytes=10-")])
            .encode()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(response.headers()[CONTENT_RANGE], "bytes */3");
    }

    #[tokio::test]
    async fn test_download_missing_file_is_encode_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = download(tmp.path().join("gone"), "gone", &[]).encode().await;
        assert!(matches!(result, Err(EncodeError::Io(_))));
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename=\"say \\\"hi\\\".txt\""
        );
    }

    #[tokio::test]
    async fn test_download_not_modified_since() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "c.txt", b"cached").await;

        let response = download(
            path.clone(),
            "c.txt",
            &[(IF_MODIFIED_SINCE, "Fri, 01 Jan 2100 00:00:00 GMT")],
        )
        .encode()
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
        assert!(response.headers().contains_key(LAST_MODIFIED));
        assert!(!response.headers().contains_key(CONTENT_LENGTH));
        assert!(body_bytes(response).await.is_empty());

        let response = download(
            path,
            "c.txt",
            &[(IF_MODIFIED_SINCE, "Thu, 01 Jan 1970 00:00:01 GMT")],
        )
        .encode()
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"cached");
    }

    #[tokio::test]
    async fn test_download_if_range() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_file(tmp.path(), "a.bin", b"hello world").await;

        let response = download(
            path.clone(),
            "a.bin",
            &[(RANGE, "bytes=0-4"), (IF_RANGE, "Sat, 01 Jan 2000 00:00:00 GMT")],
        )
        .encode()
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"hello world");

        let first = download(path.clone(), "a.bin", &[]).encode().await.unwrap();
        let last_modified = first.headers()[LAST_MODIFIED].to_str().unwrap().to_string();
        let response = download(
            path,
            "a.bin",
            &[(RANGE, "bytes=0-4"), (IF_RANGE, last_modified.as_str())],
        )
        .encode()
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(body_bytes(response).await, b"hello");
    }
}
