//! Shared application state for the HTTP service.

use std::sync::Arc;

use neuroscreen_adapters::{GeminiChat, UploadDir};
use neuroscreen_core::Analyzer;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Loaded models and face detector.
    pub analyzer: Arc<Analyzer>,
    /// Where uploads are written.
    pub uploads: Arc<UploadDir>,
    /// Chat relay, absent when no API key is configured.
    pub chat: Option<Arc<GeminiChat>>,
}

impl AppState {
    #[must_use]
    pub fn new(analyzer: Analyzer, uploads: UploadDir, chat: Option<GeminiChat>) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            uploads: Arc::new(uploads),
            chat: chat.map(Arc::new),
        }
    }
}
