//! Core types for docbundle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for an extraction task
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = String, format = Uuid)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Task lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Run in progress
    Processing,
    /// Run succeeded and the output file exists
    Completed,
    /// Run failed; see the task message
    Failed,
}

impl TaskStatus {
    /// Whether the task has reached a terminal state
    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Target representation of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OutputMode {
    /// One merged PDF (`final.pdf`)
    #[default]
    #[serde(rename = "pdf")]
    Pdf,
    /// One delimited plain-text file (`final.txt`)
    #[serde(rename = "txt", alias = "text")]
    Text,
}

impl OutputMode {
    /// File extension of artifacts produced in this mode
    pub fn extension(&self) -> &'static str {
        match self {
            OutputMode::Pdf => "pdf",
            OutputMode::Text => "txt",
        }
    }

    /// Well-known name of the aggregate output file
    pub fn final_file_name(&self) -> &'static str {
        match self {
            OutputMode::Pdf => "final.pdf",
            OutputMode::Text => "final.txt",
        }
    }

    /// MIME type used when serving the aggregate output
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputMode::Pdf => "application/pdf",
            OutputMode::Text => "text/plain; charset=utf-8",
        }
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputMode::Pdf),
            "txt" | "text" => Ok(OutputMode::Text),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown mode '{other}', expected 'pdf' or 'txt'"
            ))),
        }
    }
}

/// Pipeline stage of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching or staging the source archive
    Downloading,
    /// Expanding the source archive itself
    ExpandingRoot,
    /// Expanding every nested archive
    UnpackingRecursive,
    /// Converting discovered files to the target representation
    Normalizing,
    /// Validating and merging artifacts
    Aggregating,
    /// Removing scratch directories
    Cleanup,
}

/// Counters collected over one run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RunStats {
    /// Nested archives expanded (the root archive is not counted)
    pub archives_expanded: usize,
    /// Nested archives that failed to decode and were skipped
    pub archives_failed: usize,
    /// Files seen after unpacking settled, including skipped ones
    pub files_discovered: usize,
    /// Files classified as documents or images
    pub files_eligible: usize,
    /// Eligible files that produced an artifact
    pub files_converted: usize,
    /// Eligible files whose conversion failed
    pub files_failed: usize,
    /// Artifacts that passed validation and went into the aggregate
    pub artifacts_included: usize,
    /// Artifacts rejected by validation (empty text, unreadable or zero-page PDF)
    pub artifacts_skipped: usize,
}

/// Event emitted during a run
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task accepted and scheduled
    Queued {
        /// Task ID
        id: TaskId,
        /// Requested output mode
        mode: OutputMode,
    },

    /// Run entered a new stage
    StageChanged {
        /// Task ID
        id: TaskId,
        /// The stage just entered
        stage: Stage,
    },

    /// A nested archive was expanded
    ArchiveExpanded {
        /// Task ID
        id: TaskId,
        /// Archive path relative to the extraction root
        archive: PathBuf,
        /// Number of entries written
        entries: usize,
    },

    /// A nested archive could not be decoded
    ArchiveFailed {
        /// Task ID
        id: TaskId,
        /// Archive path relative to the extraction root
        archive: PathBuf,
        /// Decoder message
        error: String,
    },

    /// A file was converted
    FileConverted {
        /// Task ID
        id: TaskId,
        /// Source path relative to the extraction root
        source: PathBuf,
        /// Produced artifact
        artifact: PathBuf,
    },

    /// A file failed to convert
    FileFailed {
        /// Task ID
        id: TaskId,
        /// Source path relative to the extraction root
        source: PathBuf,
        /// Failure reason
        error: String,
    },

    /// Run succeeded
    Completed {
        /// Task ID
        id: TaskId,
        /// Aggregate output file
        path: PathBuf,
        /// Run counters
        stats: RunStats,
    },

    /// Run failed
    Failed {
        /// Task ID
        id: TaskId,
        /// Stage in which the run failed
        stage: Stage,
        /// Human-readable reason
        error: String,
    },
}

impl Event {
    /// Task the event belongs to
    pub fn task_id(&self) -> TaskId {
        match self {
            Event::Queued { id, .. }
            | Event::StageChanged { id, .. }
            | Event::ArchiveExpanded { id, .. }
            | Event::ArchiveFailed { id, .. }
            | Event::FileConverted { id, .. }
            | Event::FileFailed { id, .. }
            | Event::Completed { id, .. }
            | Event::Failed { id, .. } => *id,
        }
    }
}

/// Status of one task, as tracked by the task store
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskRecord {
    /// Task ID
    pub task_id: TaskId,

    /// Current status
    pub status: TaskStatus,

    /// Human-readable progress or failure message
    pub message: String,

    /// Requested output mode
    pub mode: OutputMode,

    /// Aggregate output path (set once completed)
    #[schema(value_type = Option<String>)]
    pub file_path: Option<PathBuf>,

    /// Run counters (set once completed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RunStats>,

    /// When the task was submitted
    pub created_at: DateTime<Utc>,

    /// When the task last changed
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// A freshly submitted task
    pub fn processing(task_id: TaskId, mode: OutputMode) -> Self {
        let now = Utc::now();
        Self {
            task_id,
            status: TaskStatus::Processing,
            message: "Extracting documents...".to_string(),
            mode,
            file_path: None,
            stats: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Availability of one external tool
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ToolCapabilityInfo {
    /// Whether the tool can be invoked
    pub available: bool,

    /// Name of the implementation in use (e.g., "cli-soffice", "noop")
    pub handler: String,
}

/// Overall conversion capabilities
///
/// Reports which external tools were found so API consumers can tell in
/// advance which conversions will fail with `not_supported`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Capabilities {
    /// Office converter (doc/docx/rtf/odt/txt → pdf, doc → txt)
    pub office: ToolCapabilityInfo,

    /// OCR engine (image → txt, pdf → txt)
    pub ocr: ToolCapabilityInfo,

    /// PDF page rasterizer (pdf → txt via OCR)
    pub rasterizer: ToolCapabilityInfo,
}
