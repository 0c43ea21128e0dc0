// Application state module
// Immutable per-process state shared by every connection

use super::types::Config;
use crate::routing::Router;
use crate::storage::UploadRoot;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub upload_root: UploadRoot,
    pub router: Router,
}

impl AppState {
    pub fn new(config: Config, upload_root: UploadRoot) -> Self {
        Self {
            config,
            upload_root,
            router: Router::new(),
        }
    }
}
