//! Application state for the API server

use crate::{Config, DocumentExtractor};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones).
#[derive(Clone)]
pub struct AppState {
    /// The task service
    pub extractor: Arc<DocumentExtractor>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(extractor: Arc<DocumentExtractor>, config: Arc<Config>) -> Self {
        Self { extractor, config }
    }
}
