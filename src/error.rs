//! Error types for docbundle
//!
//! This module provides the error handling for the library, including:
//! - Domain-specific error types (Extraction, Conversion, Pipeline, Task)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes
//!
//! Per-file failures ([`ConversionError`], most [`ExtractionError`]s) are
//! recorded and logged by the stage that produced them. Only [`PipelineError`]
//! and fatal acquisition/root-extraction errors ever end a run.

use crate::types::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for docbundle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docbundle
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "work_dir")
        key: Option<String>,
    },

    /// Invalid input supplied by a caller (bad URL, unknown mode, empty upload)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Archive extraction error
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Conversion error for a single file
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Terminal pipeline error (run produced nothing usable)
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Task lookup or state error
    #[error("task error: {0}")]
    Task(#[from] TaskError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be set up or used
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Operation not supported (missing binary, not implemented, etc.)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Archive extraction errors
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Decoder rejected the archive (corrupt, truncated, encrypted, ...)
    #[error("extraction failed for {archive}: {reason}")]
    Failed {
        /// The archive file that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// File name carries no archive extension the expander understands
    #[error("unknown archive format for {path}")]
    UnknownFormat {
        /// The file that could not be dispatched to a decoder
        path: PathBuf,
    },

    /// The acquired source is not an archive at all
    #[error("source is not an archive: {path}")]
    NotAnArchive {
        /// The acquired source file
        path: PathBuf,
    },
}

/// Errors converting a single file into the target representation
#[derive(Debug, Clone, Error)]
pub enum ConversionError {
    /// No conversion exists for this file in the selected mode
    #[error("unsupported format: {extension} ({path})")]
    UnsupportedFormat {
        /// Source file
        path: PathBuf,
        /// Lowercased extension, or an empty string if the file had none
        extension: String,
    },

    /// An external tool exited unsuccessfully or could not be spawned
    #[error("{tool} failed for {path}: {reason}")]
    ToolFailed {
        /// Tool name (e.g., "soffice")
        tool: String,
        /// Input file handed to the tool
        path: PathBuf,
        /// Exit status and captured stderr, or the spawn error
        reason: String,
    },

    /// An external tool exceeded the configured time bound and was killed
    #[error("{tool} timed out after {seconds}s for {path}")]
    ToolTimedOut {
        /// Tool name
        tool: String,
        /// Input file handed to the tool
        path: PathBuf,
        /// Configured bound in seconds
        seconds: u64,
    },

    /// A tool reported success but did not produce the expected file
    #[error("{tool} produced no output at {expected}")]
    MissingOutput {
        /// Tool name
        tool: String,
        /// The file the tool was expected to write
        expected: PathBuf,
    },

    /// Image decode or PDF encode failure
    #[error("image conversion failed for {path}: {reason}")]
    Image {
        /// Source image
        path: PathBuf,
        /// Decoder/encoder message
        reason: String,
    },

    /// Text extraction or artifact write failure
    #[error("text extraction failed for {path}: {reason}")]
    Text {
        /// Source file
        path: PathBuf,
        /// Underlying message
        reason: String,
    },
}

/// Terminal errors of a run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source archive could not be fetched
    #[error("download failed for {url}: {reason}")]
    Download {
        /// Source URL
        url: String,
        /// HTTP status or transport error
        reason: String,
    },

    /// Nothing eligible was converted successfully
    #[error("no files converted ({eligible} eligible, {failed} failed)")]
    NoFilesConverted {
        /// Number of convertible files discovered
        eligible: usize,
        /// Number of files whose conversion failed
        failed: usize,
    },

    /// Conversions succeeded but none passed aggregation validation
    #[error("no valid artifacts to aggregate ({converted} converted)")]
    NoValidArtifacts {
        /// Number of artifacts handed to the aggregator
        converted: usize,
    },

    /// The aggregator reported success but the final file is absent
    #[error("final file not found: {path}")]
    FinalFileNotFound {
        /// Expected location of the aggregate output
        path: PathBuf,
    },
}

/// Task lookup and lifecycle errors
#[derive(Debug, Error)]
pub enum TaskError {
    /// No task with this ID
    #[error("task {id} not found")]
    NotFound {
        /// The requested task ID
        id: TaskId,
    },

    /// The task has not completed successfully (yet)
    #[error("task {id} is {status}, file not ready")]
    NotReady {
        /// The requested task ID
        id: TaskId,
        /// Current status
        status: TaskStatus,
    },

    /// The task completed but its output file has vanished
    #[error("output file for task {id} not found at {path}")]
    FileMissing {
        /// The requested task ID
        id: TaskId,
        /// Recorded output location
        path: PathBuf,
    },

    /// The task is still running and cannot be removed
    #[error("task {id} is still processing")]
    StillProcessing {
        /// The requested task ID
        id: TaskId,
    },
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "task_not_found",
///     "message": "task 3f0c... not found",
///     "details": {
///       "task_id": "3f0c..."
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "task_not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidInput(_) => 400,
            Error::Task(TaskError::NotReady { .. }) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::Task(TaskError::NotFound { .. }) => 404,
            Error::Task(TaskError::FileMissing { .. }) => 404,

            // 409 Conflict
            Error::Task(TaskError::StillProcessing { .. }) => 409,

            // 422 Unprocessable Entity - the input was understood but unusable
            Error::Extraction(_) => 422,
            Error::Conversion(_) => 422,
            Error::Pipeline(PipelineError::NoFilesConverted { .. }) => 422,
            Error::Pipeline(PipelineError::NoValidArtifacts { .. }) => 422,

            // 500 Internal Server Error - Server-side issues
            Error::Pipeline(PipelineError::FinalFileNotFound { .. }) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - External service errors
            Error::Network(_) => 502,
            Error::Pipeline(PipelineError::Download { .. }) => 502,

            // 501 Not Implemented - Feature not supported
            Error::NotSupported(_) => 501,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidInput(_) => "validation_error",
            Error::Extraction(e) => match e {
                ExtractionError::Failed { .. } => "extraction_failed",
                ExtractionError::UnknownFormat { .. } => "unknown_archive_format",
                ExtractionError::NotAnArchive { .. } => "not_an_archive",
            },
            Error::Conversion(e) => match e {
                ConversionError::UnsupportedFormat { .. } => "unsupported_format",
                ConversionError::ToolFailed { .. } => "tool_failed",
                ConversionError::ToolTimedOut { .. } => "tool_timed_out",
                ConversionError::MissingOutput { .. } => "missing_output",
                ConversionError::Image { .. } => "image_conversion_failed",
                ConversionError::Text { .. } => "text_extraction_failed",
            },
            Error::Pipeline(e) => match e {
                PipelineError::Download { .. } => "download_failed",
                PipelineError::NoFilesConverted { .. } => "no_files_converted",
                PipelineError::NoValidArtifacts { .. } => "no_valid_artifacts",
                PipelineError::FinalFileNotFound { .. } => "final_file_not_found",
            },
            Error::Task(e) => match e {
                TaskError::NotFound { .. } => "task_not_found",
                TaskError::NotReady { .. } => "task_not_ready",
                TaskError::FileMissing { .. } => "file_not_found",
                TaskError::StillProcessing { .. } => "task_still_processing",
            },
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::NotSupported(_) => "not_supported",
            Error::NotFound(_) => "not_found",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Task(TaskError::NotFound { id })
            | Error::Task(TaskError::StillProcessing { id }) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::Task(TaskError::NotReady { id, status }) => Some(serde_json::json!({
                "task_id": id,
                "status": status,
            })),
            Error::Task(TaskError::FileMissing { id, path }) => Some(serde_json::json!({
                "task_id": id,
                "path": path,
            })),
            Error::Extraction(ExtractionError::Failed { archive, .. }) => {
                Some(serde_json::json!({
                    "archive": archive,
                }))
            }
            Error::Extraction(ExtractionError::NotAnArchive { path }) => Some(serde_json::json!({
                "path": path,
            })),
            Error::Conversion(ConversionError::UnsupportedFormat { path, extension }) => {
                Some(serde_json::json!({
                    "path": path,
                    "extension": extension,
                }))
            }
            Error::Pipeline(PipelineError::NoFilesConverted { eligible, failed }) => {
                Some(serde_json::json!({
                    "eligible": eligible,
                    "failed": failed,
                }))
            }
            Error::Pipeline(PipelineError::Download { url, .. }) => Some(serde_json::json!({
                "url": url,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
