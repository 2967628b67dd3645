use crate::error::{Error, ExtractionError, Result};
use std::path::{Component, Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

/// Run a synchronous decoder off the async runtime.
///
/// This is the single entry point behind every format: the zip, tar and rar
/// decoders are all blocking and must never run on a scheduler thread.
pub(crate) async fn extract_blocking_impl(
    format_name: &'static str,
    extract_fn: fn(&Path, &Path) -> Result<Vec<PathBuf>>,
    archive_path: &Path,
    dest_path: &Path,
) -> Result<Vec<PathBuf>> {
    debug!(?archive_path, ?dest_path, "starting {} extraction", format_name);

    let archive_owned = archive_path.to_path_buf();
    let dest_owned = dest_path.to_path_buf();

    let result = spawn_blocking(move || extract_fn(&archive_owned, &dest_owned))
        .await
        .map_err(|e| extraction_failed(archive_path, format!("extraction task panicked: {}", e)))?;

    match &result {
        Ok(files) => info!(
            ?archive_path,
            extracted_count = files.len(),
            "{} extraction successful",
            format_name
        ),
        Err(e) => warn!(
            ?archive_path,
            error = %e,
            "{} extraction failed",
            format_name
        ),
    }

    result
}

/// Build an [`ExtractionError::Failed`] for `archive_path`
pub(crate) fn extraction_failed(archive_path: &Path, reason: impl Into<String>) -> Error {
    Error::Extraction(ExtractionError::Failed {
        archive: archive_path.to_path_buf(),
        reason: reason.into(),
    })
}

/// Keep only the normal components of an entry name.
///
/// Drops root, prefix, `.` and `..` components so an entry such as
/// `../../etc/passwd` lands at `etc/passwd` inside the destination.
/// Returns `None` when nothing is left.
pub(crate) fn sanitize_entry_path(name: &Path) -> Option<PathBuf> {
    let sanitized = name
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect::<PathBuf>();

    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Create the destination directory, mapping failures to an I/O error with context
pub(crate) fn ensure_dest_dir(dest_path: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create destination {}: {}", dest_path.display(), e),
        ))
    })
}

/// Create the parent directories of an entry about to be written
pub(crate) fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create parent directories: {}", e),
            ))
        })?;
    }
    Ok(())
}
