use crate::error::{Error, Result};
use crate::inspector::{FileClass, classify};
use crate::utils::{get_unique_path, relative_to};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{ExpandOutcome, expand, extraction_dir_name};

/// Limits for [`unpack_all`]
#[derive(Clone, Copy, Debug)]
pub struct UnpackOptions {
    /// Files below this size are system artifacts and never expanded
    pub min_file_size: u64,
    /// Directories this many levels below the root are not searched for archives
    pub max_depth: u32,
}

/// What happened to one nested archive
#[derive(Clone, Debug)]
pub struct ArchiveOutcome {
    /// Archive path relative to the unpack root
    pub archive: PathBuf,
    /// Number of files written, or the decoder message
    pub result: std::result::Result<usize, String>,
}

/// Summary of a recursive unpack
#[derive(Clone, Debug, Default)]
pub struct UnpackReport {
    /// Every archive handed to the expander, in processing order, each exactly once
    pub processed: Vec<PathBuf>,
    /// Per-archive outcomes, same order as `processed`
    pub outcomes: Vec<ArchiveOutcome>,
    /// Archives left in place because they sat deeper than `max_depth`
    pub too_deep: Vec<PathBuf>,
}

impl UnpackReport {
    /// Number of archives that decoded cleanly
    pub fn expanded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of archives that failed to decode
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

/// List every archive under `dir`, sorted by path
///
/// The list is taken before anything is extracted, so the walk never
/// observes a tree that is being mutated.
async fn snapshot_archives(dir: &Path, min_file_size: u64) -> Result<Vec<PathBuf>> {
    let dir = dir.to_path_buf();
    spawn_blocking(move || {
        WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry while scanning for archives");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                match classify(entry.path(), size, min_file_size) {
                    FileClass::Archive(_) => Some(entry.into_path()),
                    _ => None,
                }
            })
            .collect()
    })
    .await
    .map_err(|e| Error::Other(format!("archive scan task panicked: {}", e)))
}

/// Expand every archive under `root` until none is left
///
/// Works through an explicit queue of `(directory, depth)` pairs. Each
/// archive is expanded into a fresh sibling directory named
/// `<stem>_extracted` (suffixed ` (n)` if taken), recorded in the processed
/// set, deleted, and its directory queued. Failed archives are logged,
/// recorded and deleted too; whatever they wrote before failing is kept.
///
/// Every expansion removes one archive from the tree and only ever adds
/// files inside a directory that did not exist before, so the loop ends for
/// any finite input.
pub async fn unpack_all(root: &Path, options: UnpackOptions) -> Result<UnpackReport> {
    let mut processed: HashSet<PathBuf> = HashSet::new();
    let mut report = UnpackReport::default();
    let mut queue: VecDeque<(PathBuf, u32)> = VecDeque::from([(root.to_path_buf(), 0)]);

    while let Some((dir, depth)) = queue.pop_front() {
        let archives = snapshot_archives(&dir, options.min_file_size).await?;
        debug!(?dir, depth, count = archives.len(), "scanned directory for archives");

        for archive in archives {
            if processed.contains(&archive) || !archive.exists() {
                continue;
            }

            if depth >= options.max_depth {
                warn!(
                    ?archive,
                    depth,
                    max_depth = options.max_depth,
                    "archive nested too deep, leaving it unexpanded"
                );
                report.too_deep.push(archive);
                continue;
            }

            let parent = archive.parent().unwrap_or(&dir);
            let dest = get_unique_path(&parent.join(extraction_dir_name(&archive)))?;

            info!(?archive, ?dest, depth, "processing nested archive");
            let outcome = expand(&archive, &dest).await;
            processed.insert(archive.clone());

            let result = match outcome {
                ExpandOutcome::Extracted { files } => Ok(files.len()),
                ExpandOutcome::Failed { reason } => Err(reason),
            };

            if let Err(e) = tokio::fs::remove_file(&archive).await {
                warn!(?archive, error = %e, "could not remove processed archive");
            } else {
                debug!(?archive, "removed processed archive");
            }

            report.outcomes.push(ArchiveOutcome {
                archive: relative_to(&archive, root),
                result,
            });
            report.processed.push(archive);

            if dest.is_dir() {
                queue.push_back((dest, depth + 1));
            }
        }
    }

    info!(
        ?root,
        expanded = report.expanded(),
        failed = report.failed(),
        too_deep = report.too_deep.len(),
        "recursive unpack settled"
    );

    Ok(report)
}
