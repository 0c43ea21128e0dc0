//! File operation handlers
//!
//! The business logic behind each route. Handlers take a decoded request and
//! return a typed result; they never build HTTP responses.

use std::io;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use http_body_util::BodyExt;
use multer::{Constraints, Field, Multipart, SizeLimit};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::config::StorageConfig;
use crate::dispatch::{
    DownloadFileRequest, DownloadStream, FileListResult, FileMetadata, ListFilesRequest,
    OperationError, UploadFileRequest, UploadResult, ViewFileRequest,
};
use crate::storage::UploadRoot;

/// Name prefix of in-flight uploads inside the upload root
const STAGING_PREFIX: &str = ".filedrop-upload-";

/// Store the configured form field under the upload root
///
/// Other fields are skipped. The stored name is the last segment of the
/// client-supplied file name. The part is staged in a temporary file next to
/// the target and renamed over it only once fully received, so a failed or
/// cancelled upload leaves neither a partial file nor a clobbered original.
pub async fn upload(
    req: UploadFileRequest,
    root: &UploadRoot,
    storage: &StorageConfig,
) -> Result<UploadResult, OperationError> {
    let body = req
        .body
        .ok_or_else(|| OperationError::BadRequest("request body missing".to_string()))?;

    let constraints = Constraints::new()
        .size_limit(SizeLimit::new().whole_stream(storage.max_upload_size));
    let mut multipart =
        Multipart::with_constraints(body.into_data_stream(), req.boundary, constraints);

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(storage.form_field.as_str()) {
            continue;
        }

        let file_name = field
            .file_name()
            .and_then(base_name)
            .ok_or_else(|| {
                OperationError::BadRequest(format!(
                    "form field '{}' carries no file name",
                    storage.form_field
                ))
            })?
            .to_string();
        let path = root.resolve(&file_name)?;

        let written = store_field(&mut field, root.path(), &path).await?;

        tracing::info!(file = %file_name, bytes = written, "file uploaded");
        return Ok(UploadResult::stored(&path));
    }

    Err(OperationError::BadRequest(format!(
        "form field '{}' not found",
        storage.form_field
    )))
}

/// Copy the field into a staged file under `dir`, then move it to `path`
///
/// The staged file is unlinked when dropped, which covers both errors and a
/// future dropped mid-copy.
async fn store_field(
    field: &mut Field<'_>,
    dir: &Path,
    path: &Path,
) -> Result<u64, OperationError> {
    let internal = |e: io::Error| {
        OperationError::Internal(format!("failed to write '{}': {e}", path.display()))
    };

    let staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)
        .map_err(internal)?;
    let (file, staged_path) = staged.into_parts();

    let mut file = File::from_std(file);
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await.map_err(internal)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(internal)?;
    drop(file);

    staged_path.persist(path).map_err(|e| {
        tracing::warn!(
            path = %path.display(),
            error = %e.error,
            "failed to move staged upload into place"
        );
        internal(e.error)
    })?;
    Ok(written)
}

/// Final path segment of a client file name, if it is usable
fn base_name(raw: &str) -> Option<&str> {
    let name = raw.rsplit(['/', '\\']).next()?.trim();
    (!name.is_empty()).then_some(name)
}

/// Confirm the file exists before handing it to the streaming encoder
pub async fn download(req: DownloadFileRequest) -> Result<DownloadStream, OperationError> {
    let metadata = fs::metadata(&req.path)
        .await
        .map_err(|e| OperationError::from_stat(&req.path, &e))?;
    if !metadata.is_file() {
        return Err(OperationError::NotFound(req.path.display().to_string()));
    }

    Ok(DownloadStream {
        file_name: req.file_name,
        path: req.path,
        head: req.head,
    })
}

/// Names of every entry in the upload root, sorted
pub async fn list(req: ListFilesRequest) -> Result<FileListResult, OperationError> {
    let internal = |e: io::Error| {
        OperationError::Internal(format!("failed to read '{}': {e}", req.path.display()))
    };

    let mut entries = fs::read_dir(&req.path).await.map_err(internal)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(internal)? {
        files.push(entry.file_name().to_string_lossy().into_owned());
    }
    files.sort();

    Ok(FileListResult { files })
}

pub async fn view(req: ViewFileRequest) -> Result<FileMetadata, OperationError> {
    let metadata = fs::metadata(&req.path)
        .await
        .map_err(|e| OperationError::from_stat(&req.path, &e))?;
    if !metadata.is_file() {
        return Err(OperationError::NotFound(req.path.display().to_string()));
    }

    let modified = metadata.modified().map_err(|e| {
        OperationError::Internal(format!(
            "modification time unavailable for '{}': {e}",
            req.path.display()
        ))
    })?;

    Ok(FileMetadata {
        name: req.name,
        size_in_bytes: metadata.len(),
        mod_time: DateTime::<Utc>::from(modified).to_rfc3339_opts(SecondsFormat::Secs, true),
    })
}
