//! Upload root module
//!
//! Owns the single directory every file operation works in: creates it at
//! startup and resolves client-supplied names into paths that stay inside it.

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Reasons a client-supplied name cannot be mapped into the upload root
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("file name is empty")]
    Empty,
    #[error("file name '{0}' is not a single path segment")]
    NotFlat(String),
    #[error("resolved path '{0}' escapes the upload root")]
    Escapes(String),
}

/// Handle to the directory holding all managed files
#[derive(Debug, Clone)]
pub struct UploadRoot {
    dir: PathBuf,
}

impl UploadRoot {
    /// Wrap an existing directory without touching the filesystem
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create the upload directory (and missing parents) if needed
    ///
    /// Called once by the process entry point before the listener is bound.
    pub async fn ensure(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(path = %dir.display(), "upload root ready");
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Resolve a flat file name to its location under the root
    pub fn resolve(&self, name: &str) -> Result<PathBuf, PathError> {
        if name.is_empty() {
            return Err(PathError::Empty);
        }
        if name.contains(['/', '\\', '\0']) {
            return Err(PathError::NotFlat(name.to_string()));
        }

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return Err(PathError::NotFlat(name.to_string())),
        }

        let resolved = self.dir.join(name);
        if resolved.parent() != Some(self.dir.as_path()) || !resolved.starts_with(&self.dir) {
            return Err(PathError::Escapes(resolved.display().to_string()));
        }
        Ok(resolved)
    }
}
