//! Run orchestration
//!
//! One run walks a fixed sequence of stages:
//!
//! ```text
//! Downloading → ExpandingRoot → UnpackingRecursive → Normalizing → Aggregating → Cleanup
//! ```
//!
//! Failures while acquiring or expanding the source archive end the run.
//! Failures of individual nested archives or files are counted, logged and
//! skipped. A run succeeds only if the aggregate file exists at the end.
//!
//! All acquisition and extraction happens in a scratch directory
//! `scratch_<task_id>_*` under the work directory. It is a [`TempDir`], so it
//! is removed on every exit path, including panics and dropped futures. The
//! output directory `extracted_documents_<task_id>` is kept on success and
//! removed on failure.

mod acquire;

pub use acquire::Source;

use crate::aggregation::aggregate;
use crate::config::Config;
use crate::conversion::{ConversionResult, Normalizer, Toolchain};
use crate::error::{Error, PipelineError, Result};
use crate::extraction::{UnpackOptions, extract_archive, unpack_all};
use crate::inspector::FileNode;
use crate::types::{Event, OutputMode, RunStats, Stage, TaskId};
use crate::utils::relative_to;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Outcome of a successful run
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// The aggregate file, `final.pdf` or `final.txt`
    pub output_path: PathBuf,
    /// Run counters
    pub stats: RunStats,
}

/// Executes runs: acquire, unpack, normalize, aggregate, clean up
pub struct Pipeline {
    config: Arc<Config>,
    normalizer: Normalizer,
    event_tx: broadcast::Sender<Event>,
}

/// Tracks the stage a run is in, announcing each transition
struct Progress<'a> {
    id: TaskId,
    stage: Stage,
    event_tx: &'a broadcast::Sender<Event>,
}

impl Progress<'_> {
    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        info!(task_id = %self.id, ?stage, "entering stage");
        self.event_tx.send(Event::StageChanged { id: self.id, stage }).ok();
    }
}

impl Pipeline {
    /// Create a pipeline over a config and toolchain
    pub fn new(config: Arc<Config>, toolchain: Toolchain, event_tx: broadcast::Sender<Event>) -> Self {
        let normalizer = Normalizer::new(toolchain, config.conversion.clone());
        Self {
            config,
            normalizer,
            event_tx,
        }
    }

    fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Execute one run to completion
    ///
    /// Returns the location of the aggregate output. On error the scratch
    /// directory and the output directory are both gone.
    pub async fn run(&self, id: TaskId, source: Source, mode: OutputMode) -> Result<RunSummary> {
        let work_dir = &self.config.work_dir;
        tokio::fs::create_dir_all(work_dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create work directory {}: {}", work_dir.display(), e),
            ))
        })?;

        let scratch = tempfile::Builder::new()
            .prefix(&format!("scratch_{id}_"))
            .tempdir_in(work_dir)?;
        let out_dir = self.config.output_dir_for(&id);

        info!(task_id = %id, source = %source.describe(), %mode, scratch = ?scratch.path(), "starting run");

        let mut progress = Progress {
            id,
            stage: Stage::Downloading,
            event_tx: &self.event_tx,
        };
        let result = self.execute(&mut progress, source, mode, &scratch, &out_dir).await;
        let failed_stage = progress.stage;

        progress.enter(Stage::Cleanup);
        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(task_id = %id, scratch = ?scratch_path, error = %e, "failed to remove scratch directory");
        }

        match result {
            Ok(summary) => {
                info!(
                    task_id = %id,
                    output = ?summary.output_path,
                    included = summary.stats.artifacts_included,
                    "run completed"
                );
                self.emit(Event::Completed {
                    id,
                    path: summary.output_path.clone(),
                    stats: summary.stats,
                });
                Ok(summary)
            }
            Err(e) => {
                error!(task_id = %id, stage = ?failed_stage, error = %e, "run failed");
                if let Err(remove_err) = tokio::fs::remove_dir_all(&out_dir).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!(task_id = %id, ?out_dir, error = %remove_err, "failed to remove partial output");
                    }
                }
                self.emit(Event::Failed {
                    id,
                    stage: failed_stage,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        progress: &mut Progress<'_>,
        source: Source,
        mode: OutputMode,
        scratch: &TempDir,
        out_dir: &Path,
    ) -> Result<RunSummary> {
        let id = progress.id;
        let mut stats = RunStats::default();

        progress.enter(Stage::Downloading);
        let acquired = acquire::acquire(source, &self.config.download, &scratch.path().join("source")).await?;

        progress.enter(Stage::ExpandingRoot);
        let root = scratch.path().join("extracted");
        let files = extract_archive(acquired.kind, &acquired.path, &root).await?;
        info!(task_id = %id, entries = files.len(), "source archive expanded");
        if let Err(e) = tokio::fs::remove_file(&acquired.path).await {
            warn!(task_id = %id, path = ?acquired.path, error = %e, "failed to remove source archive");
        }

        progress.enter(Stage::UnpackingRecursive);
        let options = UnpackOptions {
            min_file_size: self.config.inspection.min_file_size,
            max_depth: self.config.extraction.max_depth,
        };
        let report = unpack_all(&root, options).await?;
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(entries) => self.emit(Event::ArchiveExpanded {
                    id,
                    archive: outcome.archive.clone(),
                    entries: *entries,
                }),
                Err(reason) => self.emit(Event::ArchiveFailed {
                    id,
                    archive: outcome.archive.clone(),
                    error: reason.clone(),
                }),
            }
        }
        stats.archives_expanded = report.expanded();
        stats.archives_failed = report.failed();

        progress.enter(Stage::Normalizing);
        tokio::fs::create_dir_all(out_dir).await?;
        let results = self.normalize_all(id, &root, mode, out_dir, &mut stats).await?;

        if stats.files_converted == 0 {
            return Err(PipelineError::NoFilesConverted {
                eligible: stats.files_eligible,
                failed: stats.files_failed,
            }
            .into());
        }

        progress.enter(Stage::Aggregating);
        let output = aggregate(&results, mode, out_dir)
            .await
            .ok_or(PipelineError::NoValidArtifacts {
                converted: stats.files_converted,
            })?;
        stats.artifacts_included = output.included;
        stats.artifacts_skipped = output.skipped;

        if !tokio::fs::try_exists(&output.path).await.unwrap_or(false) {
            return Err(PipelineError::FinalFileNotFound { path: output.path }.into());
        }

        Ok(RunSummary {
            output_path: output.path,
            stats,
        })
    }

    async fn normalize_all(
        &self,
        id: TaskId,
        root: &Path,
        mode: OutputMode,
        out_dir: &Path,
        stats: &mut RunStats,
    ) -> Result<Vec<ConversionResult>> {
        let files = discover_files(root, self.config.conversion.sort_discovered).await?;
        let min_size = self.config.inspection.min_file_size;
        let mut results = Vec::new();

        for path in files {
            let node = FileNode::inspect(&path, min_size);
            stats.files_discovered += 1;

            if !node.class.is_convertible() {
                debug!(task_id = %id, path = ?node.path, class = ?node.class, "skipping file");
                continue;
            }
            stats.files_eligible += 1;

            let result = self.normalizer.normalize(&node, mode, out_dir).await;
            let source = relative_to(&node.path, root);
            match &result.outcome {
                Ok(artifact) => {
                    stats.files_converted += 1;
                    self.emit(Event::FileConverted {
                        id,
                        source,
                        artifact: artifact.clone(),
                    });
                }
                Err(e) => {
                    stats.files_failed += 1;
                    self.emit(Event::FileFailed {
                        id,
                        source,
                        error: e.to_string(),
                    });
                }
            }
            results.push(result);
        }

        info!(
            task_id = %id,
            discovered = stats.files_discovered,
            eligible = stats.files_eligible,
            converted = stats.files_converted,
            failed = stats.files_failed,
            "normalization settled"
        );

        Ok(results)
    }
}

/// Every regular file under `root`, optionally sorted by relative path
async fn discover_files(root: &Path, sort: bool) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut files: Vec<PathBuf> = WalkDir::new(&root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();

        if sort {
            files.sort_by_cached_key(|path| relative_to(path, &root));
        }
        files
    })
    .await
    .map_err(|e| Error::Other(format!("file discovery panicked: {}", e)))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
