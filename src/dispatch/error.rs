//! Dispatch error types
//!
//! `OperationError` is what handlers return; the dispatcher alone turns it into
//! a status code and envelope. Decode and encode failures have their own types
//! because they are mapped by pipeline stage, not by kind.

use std::io;
use std::path::Path;

use hyper::StatusCode;
use thiserror::Error;

use crate::http::response::{ERR_BAD_REQUEST, ERR_INTERNAL, ERR_NOT_FOUND};
use crate::storage::PathError;

/// Failure of a file operation handler
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl OperationError {
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the client-facing envelope
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => ERR_BAD_REQUEST,
            Self::NotFound(_) => ERR_NOT_FOUND,
            Self::Internal(_) => ERR_INTERNAL,
        }
    }

    /// Classify a failed `stat` on a stored file
    ///
    /// A missing file is `NotFound`; anything else (permissions, I/O) is
    /// `Internal`. View and Download share this mapping.
    pub fn from_stat(path: &Path, err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::Internal(format!("failed to stat '{}': {err}", path.display()))
        }
    }
}

impl From<multer::Error> for OperationError {
    fn from(err: multer::Error) -> Self {
        match err {
            multer::Error::StreamSizeExceeded { limit } => {
                Self::BadRequest(format!("multipart form exceeds {limit} bytes"))
            }
            other => Self::BadRequest(format!("malformed multipart form: {other}")),
        }
    }
}

impl From<PathError> for OperationError {
    fn from(err: PathError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Failure turning a raw request into a typed request
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("missing path parameter '{0}'")]
    MissingParam(&'static str),
    #[error("path parameter '{0}' is not valid UTF-8")]
    InvalidEncoding(&'static str),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("missing or invalid multipart content type: {0}")]
    ContentType(String),
}

/// Failure turning a typed response into a raw response
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to prepare file stream: {0}")]
    Io(#[from] io::Error),
    #[error("failed to build response: {0}")]
    Http(#[from] hyper::http::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_message_mapping() {
        let cases = [
            (
                OperationError::BadRequest("x".into()),
                StatusCode::BAD_REQUEST,
                "Bad request",
            ),
            (
                OperationError::NotFound("x".into()),
                StatusCode::NOT_FOUND,
                "State not found",
            ),
            (
                OperationError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
            ),
        ];

        for (err, status, message) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.public_message(), message);
        }
    }

    #[test]
    fn test_from_stat_distinguishes_missing() {
        let path = Path::new("uploads/a.txt");
        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert!(matches!(
            OperationError::from_stat(path, &missing),
            OperationError::NotFound(_)
        ));

        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(
            OperationError::from_stat(path, &denied),
            OperationError::Internal(_)
        ));
    }

    #[test]
    fn test_size_limit_is_bad_request() {
        let err = OperationError::from(multer::Error::StreamSizeExceeded { limit: 16 });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("16"));
    }
}
