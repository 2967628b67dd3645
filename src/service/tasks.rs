//! In-memory task registry

use crate::error::{Error, Result, TaskError};
use crate::types::{RunStats, TaskId, TaskRecord, TaskStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Task records keyed by ID, behind a single lock
///
/// Every read-modify-write happens under one write guard, so concurrent runs
/// never race on a record.
#[derive(Clone, Default)]
pub struct TaskStore {
    inner: Arc<RwLock<HashMap<TaskId, TaskRecord>>>,
}

impl TaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task
    pub async fn insert(&self, record: TaskRecord) {
        self.inner.write().await.insert(record.task_id, record);
    }

    /// Snapshot of one record
    pub async fn get(&self, id: TaskId) -> Option<TaskRecord> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Snapshot of every record, oldest first
    pub async fn list(&self) -> Vec<TaskRecord> {
        let mut records: Vec<TaskRecord> = self.inner.read().await.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        records
    }

    /// Mark a task completed with its output
    pub async fn complete(&self, id: TaskId, file_path: PathBuf, stats: RunStats) {
        if let Some(record) = self.inner.write().await.get_mut(&id) {
            record.status = TaskStatus::Completed;
            record.message = "Extraction completed successfully".to_string();
            record.file_path = Some(file_path);
            record.stats = Some(stats);
            record.updated_at = Utc::now();
        }
    }

    /// Mark a task failed
    pub async fn fail(&self, id: TaskId, message: String) {
        if let Some(record) = self.inner.write().await.get_mut(&id) {
            record.status = TaskStatus::Failed;
            record.message = message;
            record.file_path = None;
            record.updated_at = Utc::now();
        }
    }

    /// Remove a finished task, returning its last record
    pub async fn remove_finished(&self, id: TaskId) -> Result<TaskRecord> {
        let mut tasks = self.inner.write().await;
        match tasks.get(&id) {
            None => Err(Error::Task(TaskError::NotFound { id })),
            Some(record) if !record.status.is_finished() => {
                Err(Error::Task(TaskError::StillProcessing { id }))
            }
            Some(_) => tasks
                .remove(&id)
                .ok_or(Error::Task(TaskError::NotFound { id })),
        }
    }

    /// Number of tasks currently recorded
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether no tasks are recorded
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
