use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::shared::{
    ensure_dest_dir, ensure_parent_dir, extract_blocking_impl, extraction_failed,
    sanitize_entry_path,
};

/// Archive extractor for plain and gzip-compressed tarballs
pub struct TarExtractor;

impl TarExtractor {
    /// Walk a tar stream and write regular files under `dest_path`
    ///
    /// Symlinks, hardlinks and device entries are skipped.
    fn extract_entries<R: Read>(
        reader: R,
        archive_path: &Path,
        dest_path: &Path,
    ) -> Result<Vec<PathBuf>> {
        let mut archive = tar::Archive::new(reader);
        let entries = archive
            .entries()
            .map_err(|e| extraction_failed(archive_path, format!("failed to read tar: {}", e)))?;

        let mut extracted_files = Vec::new();

        for entry in entries {
            let mut entry = entry.map_err(|e| {
                extraction_failed(archive_path, format!("failed to read tar entry: {}", e))
            })?;

            let entry_type = entry.header().entry_type();
            let raw_path = entry
                .path()
                .map_err(|e| extraction_failed(archive_path, format!("bad entry path: {}", e)))?
                .into_owned();

            let Some(sanitized) = sanitize_entry_path(&raw_path) else {
                debug!(?archive_path, ?raw_path, "skipping entry with unsafe path");
                continue;
            };
            let file_path = dest_path.join(sanitized);

            if entry_type.is_dir() {
                std::fs::create_dir_all(&file_path).map_err(|e| {
                    Error::Io(std::io::Error::new(
                        e.kind(),
                        format!("failed to create directory: {}", e),
                    ))
                })?;
                continue;
            }

            if !entry_type.is_file() {
                debug!(?archive_path, ?raw_path, ?entry_type, "skipping non-regular entry");
                continue;
            }

            ensure_parent_dir(&file_path)?;
            entry.unpack(&file_path).map_err(|e| {
                extraction_failed(
                    archive_path,
                    format!("failed to extract {}: {}", raw_path.display(), e),
                )
            })?;
            extracted_files.push(file_path);
        }

        Ok(extracted_files)
    }

    /// Extract an uncompressed `.tar` into `dest_path`
    pub fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting TAR extraction");
        ensure_dest_dir(dest_path)?;
        let file = std::fs::File::open(archive_path)?;
        Self::extract_entries(file, archive_path, dest_path)
    }

    /// Extract a `.tar.gz` / `.tgz` into `dest_path`
    pub fn extract_gz(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting TAR.GZ extraction");
        ensure_dest_dir(dest_path)?;
        let file = std::fs::File::open(archive_path)?;
        Self::extract_entries(GzDecoder::new(file), archive_path, dest_path)
    }

    /// Extract an uncompressed tarball without blocking the runtime
    pub async fn extract_async(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_blocking_impl("TAR", Self::extract, archive_path, dest_path).await
    }

    /// Extract a gzip tarball without blocking the runtime
    pub async fn extract_gz_async(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_blocking_impl("TAR.GZ", Self::extract_gz, archive_path, dest_path).await
    }
}
