//! Archive extraction
//!
//! This module expands ZIP, TAR, TAR.GZ and RAR archives. Two entry points
//! are offered on top of the per-format extractors:
//!
//! - [`extract_archive`] is strict and returns the decoder error. The pipeline
//!   uses it for the source archive, whose failure ends the run.
//! - [`expand`] is soft: any decode error is logged and reported as
//!   [`ExpandOutcome::Failed`]. The [`unpack_all`] worklist uses it for every
//!   nested archive so one corrupt member never stops the run.

mod rar;
mod recursive;
mod shared;
mod tar;
mod zip;


// Re-exports
pub use rar::RarExtractor;
pub use recursive::{ArchiveOutcome, UnpackOptions, UnpackReport, unpack_all};
pub use tar::TarExtractor;
pub use zip::ZipExtractor;

use crate::error::{Error, ExtractionError, Result};
use crate::inspector::{ArchiveKind, archive_kind_from_name};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Result of a soft expansion
#[derive(Debug)]
pub enum ExpandOutcome {
    /// The archive was decoded; holds the files written
    Extracted {
        /// Files written under the destination directory
        files: Vec<PathBuf>,
    },
    /// The archive could not be decoded; anything written before the error stays
    Failed {
        /// Decoder message
        reason: String,
    },
}

/// Unified archive extraction dispatcher
///
/// Routes to the extractor matching `kind` and returns every file written.
///
/// # Example
/// ```no_run
/// use docbundle::extraction::extract_archive;
/// use docbundle::inspector::ArchiveKind;
/// use std::path::PathBuf;
///
/// # async fn example() -> docbundle::Result<()> {
/// let files = extract_archive(
///     ArchiveKind::Zip,
///     &PathBuf::from("bundle.zip"),
///     &PathBuf::from("/tmp/extract"),
/// ).await?;
/// println!("Extracted {} files", files.len());
/// # Ok(())
/// # }
/// ```
pub async fn extract_archive(
    kind: ArchiveKind,
    archive_path: &Path,
    dest_path: &Path,
) -> Result<Vec<PathBuf>> {
    info!(?archive_path, ?kind, "dispatching extraction to appropriate extractor");

    match kind {
        ArchiveKind::Zip => ZipExtractor::extract_async(archive_path, dest_path).await,
        ArchiveKind::Tar => TarExtractor::extract_async(archive_path, dest_path).await,
        ArchiveKind::TarGz => TarExtractor::extract_gz_async(archive_path, dest_path).await,
        ArchiveKind::Rar => RarExtractor::extract_async(archive_path, dest_path).await,
    }
}

/// Expand one archive, never failing
///
/// The archive kind is taken from the file name. An unknown suffix is
/// reported like any other decode failure.
pub async fn expand(archive_path: &Path, dest_path: &Path) -> ExpandOutcome {
    let result = match archive_kind_from_name(archive_path) {
        Some(kind) => extract_archive(kind, archive_path, dest_path).await,
        None => Err(Error::Extraction(ExtractionError::UnknownFormat {
            path: archive_path.to_path_buf(),
        })),
    };

    match result {
        Ok(files) => ExpandOutcome::Extracted { files },
        Err(e) => {
            warn!(?archive_path, error = %e, "skipping archive that failed to extract");
            ExpandOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Directory name an archive expands into: `<stem>_extracted`
///
/// Compound suffixes are stripped whole, so `bundle.tar.gz` gives
/// `bundle_extracted`.
pub fn extraction_dir_name(archive_path: &Path) -> String {
    let name = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let lower = name.to_ascii_lowercase();
    let stem = if lower.ends_with(".tar.gz") {
        &name[..name.len() - ".tar.gz".len()]
    } else {
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name.as_str(),
        }
    };

    if stem.is_empty() {
        "archive_extracted".to_string()
    } else {
        format!("{stem}_extracted")
    }
}
