//! Final output assembly
//!
//! Takes the per-file [`ConversionResult`]s of a run, in discovery order,
//! validates each artifact and folds the valid ones into a single file in
//! the output directory:
//!
//! - **pdf**: every artifact must open and have at least one page; pages are
//!   merged in order into `final.pdf`.
//! - **txt**: artifacts that are empty or whitespace-only are skipped; the
//!   rest are concatenated into `final.txt`, each prefixed with a
//!   `--- <source name> ---` line.
//!
//! The final file is written to a temporary name and renamed into place, so
//! a failed write leaves no output behind.

mod pdf;
mod text;

use crate::conversion::ConversionResult;
use crate::types::OutputMode;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task::spawn_blocking;
use tracing::{error, info, warn};

/// The merged document produced by a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateOutput {
    /// Location of `final.pdf` / `final.txt`
    pub path: PathBuf,
    /// Representation of the output
    pub mode: OutputMode,
    /// Artifacts that passed validation and were included
    pub included: usize,
    /// Artifacts rejected by validation
    pub skipped: usize,
}

/// A successfully converted artifact and the name of its source
struct Artifact {
    source_name: String,
    path: PathBuf,
}

fn collect_artifacts(results: &[ConversionResult]) -> Vec<Artifact> {
    results
        .iter()
        .filter_map(|r| {
            r.artifact().map(|path| Artifact {
                source_name: r.source.file_name(),
                path: path.to_path_buf(),
            })
        })
        .collect()
}

/// Write through a sibling temp file and rename into place
fn persist(
    target: &Path,
    write: impl FnOnce(&mut NamedTempFile) -> Result<(), String>,
) -> Result<(), String> {
    let dir = target.parent().ok_or("output path has no parent directory")?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".final_")
        .tempfile_in(dir)
        .map_err(|e| format!("failed to create temporary file: {}", e))?;
    write(&mut tmp)?;
    tmp.persist(target)
        .map_err(|e| format!("failed to move output into place: {}", e.error))?;
    Ok(())
}

/// Validate and merge PDF artifacts; returns `(included, skipped)`
fn merge_pdfs(artifacts: &[Artifact], target: &Path) -> Option<(usize, usize)> {
    let mut documents = Vec::with_capacity(artifacts.len());
    let mut skipped = 0;

    for artifact in artifacts {
        match pdf::load_valid(&artifact.path) {
            Ok(doc) => documents.push(doc),
            Err(reason) => {
                warn!(
                    source = %artifact.source_name,
                    artifact = ?artifact.path,
                    %reason,
                    "excluding invalid PDF from merge"
                );
                skipped += 1;
            }
        }
    }

    if documents.is_empty() {
        warn!(skipped, "no valid PDF artifacts to merge");
        return None;
    }
    let included = documents.len();

    let written = pdf::merge(documents).and_then(|mut merged| {
        persist(target, |file| {
            merged
                .save_to(file)
                .map_err(|e| format!("failed to write merged PDF: {}", e))
        })
    });

    match written {
        Ok(()) => Some((included, skipped)),
        Err(reason) => {
            error!(path = ?target, %reason, "failed to write merged PDF");
            None
        }
    }
}

async fn concatenate_texts(artifacts: &[Artifact], target: PathBuf) -> Option<(usize, usize)> {
    let mut output = String::new();
    let mut included = 0;
    let mut skipped = 0;

    for artifact in artifacts {
        let content = match tokio::fs::read(&artifact.path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!(source = %artifact.source_name, artifact = ?artifact.path, error = %e, "failed to read text artifact");
                skipped += 1;
                continue;
            }
        };

        if !text::has_content(&content) {
            warn!(source = %artifact.source_name, "skipping empty text artifact");
            skipped += 1;
            continue;
        }

        output.push_str(&text::delimited_block(&artifact.source_name, &content));
        included += 1;
    }

    if included == 0 {
        warn!(skipped, "no text artifacts with content");
        return None;
    }

    let written = spawn_blocking(move || {
        persist(&target, |file| {
            std::io::Write::write_all(file, output.as_bytes())
                .map_err(|e| format!("failed to write text output: {}", e))
        })
    })
    .await
    .unwrap_or_else(|e| Err(format!("text write task panicked: {}", e)));

    match written {
        Ok(()) => Some((included, skipped)),
        Err(reason) => {
            error!(%reason, "failed to write aggregated text");
            None
        }
    }
}

/// Fold converted artifacts into one output file in `out_dir`
///
/// Failed conversions in `results` are ignored. Returns `None` when no
/// artifact passes validation or the output could not be written; in both
/// cases no final file exists afterwards.
pub async fn aggregate(
    results: &[ConversionResult],
    mode: OutputMode,
    out_dir: &Path,
) -> Option<AggregateOutput> {
    let artifacts = collect_artifacts(results);
    let target = out_dir.join(mode.final_file_name());

    let counts = match mode {
        OutputMode::Pdf => {
            let path = target.clone();
            spawn_blocking(move || merge_pdfs(&artifacts, &path))
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "PDF merge task panicked");
                    None
                })
        }
        OutputMode::Text => concatenate_texts(&artifacts, target.clone()).await,
    };

    let (included, skipped) = counts?;
    info!(path = ?target, included, skipped, %mode, "aggregate output written");

    Some(AggregateOutput {
        path: target,
        mode,
        included,
        skipped,
    })
}
