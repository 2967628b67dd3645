//! Task service: runs pipelines in the background and tracks their state
//!
//! [`DocumentExtractor`] is the library's main handle. It owns the
//! configuration, the resolved toolchain, the event channel and the task
//! registry, and is what the HTTP layer talks to.

mod tasks;

pub use tasks::TaskStore;

use crate::config::Config;
use crate::conversion::Toolchain;
use crate::error::{Error, PipelineError, Result, TaskError};
use crate::pipeline::{Pipeline, RunSummary, Source};
use crate::types::{Capabilities, Event, OutputMode, TaskId, TaskRecord, TaskStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// Capacity of the event channel; slow subscribers miss older events
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main entry point: submit archives, query tasks, subscribe to events
///
/// # Example
///
/// ```no_run
/// use docbundle::{Config, DocumentExtractor, OutputMode, Source};
///
/// # async fn example() -> docbundle::Result<()> {
/// let extractor = DocumentExtractor::new(Config::default())?;
/// let id = extractor
///     .submit(Source::Url("https://example.com/docs.zip".into()), OutputMode::Pdf)
///     .await;
///
/// let record = extractor.status(id).await?;
/// println!("{}: {}", record.status, record.message);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DocumentExtractor {
    config: Arc<Config>,
    toolchain: Toolchain,
    pipeline: Arc<Pipeline>,
    event_tx: broadcast::Sender<Event>,
    tasks: TaskStore,
}

impl DocumentExtractor {
    /// Validate `config` and resolve the external tools it names
    pub fn new(config: Config) -> Result<Self> {
        let toolchain = Toolchain::from_config(&config.tools);
        Self::with_toolchain(config, toolchain)
    }

    /// Validate `config` and use the given toolchain
    pub fn with_toolchain(config: Config, toolchain: Toolchain) -> Result<Self> {
        config.validate()?;

        let config = Arc::new(config);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let pipeline = Arc::new(Pipeline::new(config.clone(), toolchain.clone(), event_tx.clone()));

        Ok(Self {
            config,
            toolchain,
            pipeline,
            event_tx,
            tasks: TaskStore::new(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Which external tools are usable
    pub fn capabilities(&self) -> Capabilities {
        self.toolchain.capabilities()
    }

    /// Start a run in the background and return its task ID immediately
    pub async fn submit(&self, source: Source, mode: OutputMode) -> TaskId {
        let id = TaskId::new();
        self.tasks.insert(TaskRecord::processing(id, mode)).await;
        self.event_tx.send(Event::Queued { id, mode }).ok();
        info!(task_id = %id, source = %source.describe(), %mode, "task submitted");

        let pipeline = self.pipeline.clone();
        let tasks = self.tasks.clone();
        let run = tokio::spawn(async move { pipeline.run(id, source, mode).await });
        tokio::spawn(async move {
            match run.await {
                Ok(Ok(summary)) => tasks.complete(id, summary.output_path, summary.stats).await,
                Ok(Err(e)) => tasks.fail(id, failure_message(&e)).await,
                Err(e) => {
                    error!(task_id = %id, error = %e, "extraction run aborted");
                    tasks.fail(id, format!("Extraction failed: run aborted: {}", e)).await
                }
            }
        });

        id
    }

    /// Run to completion in the caller's task, without registering a task
    pub async fn extract(&self, source: Source, mode: OutputMode) -> Result<RunSummary> {
        self.pipeline.run(TaskId::new(), source, mode).await
    }

    /// Current record of a task
    pub async fn status(&self, id: TaskId) -> Result<TaskRecord> {
        self.tasks
            .get(id)
            .await
            .ok_or(Error::Task(TaskError::NotFound { id }))
    }

    /// Every known task, oldest first
    pub async fn list(&self) -> Vec<TaskRecord> {
        self.tasks.list().await
    }

    /// Aggregate output of a completed task
    ///
    /// Fails if the task is unknown, not completed, or its file is gone.
    pub async fn output_file(&self, id: TaskId) -> Result<(PathBuf, OutputMode)> {
        let record = self.status(id).await?;
        let path = match (record.status, record.file_path) {
            (TaskStatus::Completed, Some(path)) => path,
            (status, _) => return Err(Error::Task(TaskError::NotReady { id, status })),
        };

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(Error::Task(TaskError::FileMissing { id, path }));
        }

        Ok((path, record.mode))
    }

    /// Forget a finished task and delete its output directory
    pub async fn remove_task(&self, id: TaskId) -> Result<()> {
        self.tasks.remove_finished(id).await?;

        let out_dir = self.config.output_dir_for(&id);
        match tokio::fs::remove_dir_all(&out_dir).await {
            Ok(()) => info!(task_id = %id, ?out_dir, "removed task output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(task_id = %id, ?out_dir, error = %e, "failed to remove task output"),
        }
        Ok(())
    }
}

/// Message recorded on a failed task
fn failure_message(error: &Error) -> String {
    match error {
        Error::Pipeline(PipelineError::FinalFileNotFound { .. }) => "Final file not found".to_string(),
        other => format!("Extraction failed: {}", other),
    }
}
