use std::sync::Arc;

use crate::{http::upload::UploadConfig, store::JobStore};

/// Dependencies shared by every request handler.
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub uploads: UploadConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn JobStore>, uploads: UploadConfig) -> Self {
        Self { store, uploads }
    }
}
