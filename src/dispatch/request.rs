//! Request variants
//!
//! Each variant starts blank (`Default`) and fills itself from the raw request.
//! The dispatcher is generic over the variant, so the blank instance is what
//! lets it obtain a value before any field is known.

use std::path::PathBuf;

use hyper::header::CONTENT_TYPE;
use hyper::http::request::Parts;
use percent_encoding::percent_decode_str;

use super::error::DecodeError;
use crate::http::RequestBody;
use crate::routing::PathParams;
use crate::storage::UploadRoot;

/// A request as received from the connection, with route parameters attached
pub struct RawRequest {
    pub head: Parts,
    pub params: PathParams,
    pub body: RequestBody,
}

impl RawRequest {
    pub fn new(request: hyper::Request<RequestBody>, params: PathParams) -> Self {
        let (head, body) = request.into_parts();
        Self { head, params, body }
    }

    /// Percent-decoded value of a required path parameter
    fn param(&self, name: &'static str) -> Result<String, DecodeError> {
        let raw = self
            .params
            .get(name)
            .ok_or(DecodeError::MissingParam(name))?;
        percent_decode_str(raw)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|_| DecodeError::InvalidEncoding(name))
    }
}

/// Typed operation input decoded from a [`RawRequest`]
pub trait DecodeRequest: Default + Send {
    fn decode(&mut self, raw: RawRequest, root: &UploadRoot) -> Result<(), DecodeError>;
}

/// `GET /file/{name}`
#[derive(Debug, Default)]
pub struct ViewFileRequest {
    pub name: String,
    pub path: PathBuf,
}

impl DecodeRequest for ViewFileRequest {
    fn decode(&mut self, raw: RawRequest, root: &UploadRoot) -> Result<(), DecodeError> {
        let name = raw.param("name")?;
        self.path = root.resolve(&name)?;
        self.name = name;
        Ok(())
    }
}

/// `GET /files`
#[derive(Debug, Default)]
pub struct ListFilesRequest {
    pub path: PathBuf,
}

impl DecodeRequest for ListFilesRequest {
    fn decode(&mut self, _raw: RawRequest, root: &UploadRoot) -> Result<(), DecodeError> {
        self.path = root.path().to_path_buf();
        Ok(())
    }
}

/// `GET /download/{name}`
///
/// Keeps the request head so the encoder can honor `Range`.
#[derive(Debug, Default)]
pub struct DownloadFileRequest {
    pub file_name: String,
    pub path: PathBuf,
    pub head: Option<Parts>,
}

impl DecodeRequest for DownloadFileRequest {
    fn decode(&mut self, raw: RawRequest, root: &UploadRoot) -> Result<(), DecodeError> {
        let file_name = raw.param("name")?;
        self.path = root.resolve(&file_name)?;
        self.file_name = file_name;
        self.head = Some(raw.head);
        Ok(())
    }
}

/// `POST /upload`
#[derive(Default)]
pub struct UploadFileRequest {
    pub boundary: String,
    pub body: Option<RequestBody>,
}

impl std::fmt::Debug for UploadFileRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFileRequest")
            .field("boundary", &self.boundary)
            .field("body", &self.body.as_ref().map(|_| ".."))
            .finish()
    }
}

impl DecodeRequest for UploadFileRequest {
    fn decode(&mut self, raw: RawRequest, _root: &UploadRoot) -> Result<(), DecodeError> {
        let content_type = raw
            .head
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| DecodeError::ContentType("header absent".to_string()))?;

        self.boundary = multer::parse_boundary(content_type)
            .map_err(|e| DecodeError::ContentType(e.to_string()))?;
        self.body = Some(raw.body);
        Ok(())
    }
}
