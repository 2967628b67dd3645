//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Submitting archives and tracking tasks
//! - [`files`] - Serving finished outputs
//! - [`system`] - Health, capabilities, events, OpenAPI

use crate::error::Error;
use crate::types::{OutputMode, TaskId};
use serde::{Deserialize, Serialize};

mod files;
mod system;
mod tasks;

pub use files::*;
pub use system::*;
pub use tasks::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /extract
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ExtractRequest {
    /// URL of the archive to process
    pub url: String,
    /// Output representation: "pdf" (default) or "txt"
    #[serde(default)]
    pub mode: OutputMode,
}

/// Response for POST /extract and POST /extract/upload
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ExtractResponse {
    /// ID to poll with GET /status/{id}
    pub task_id: TaskId,
    /// Always "started"
    pub status: String,
    /// Human-readable message
    pub message: String,
}

impl ExtractResponse {
    fn started(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: "started".to_string(),
            message: "Extraction started".to_string(),
        }
    }
}

/// Parse a task ID from a path segment; malformed IDs are simply unknown
fn parse_task_id(raw: &str) -> Result<TaskId, Error> {
    raw.parse()
        .map_err(|_| Error::NotFound(format!("task {} not found", raw)))
}
