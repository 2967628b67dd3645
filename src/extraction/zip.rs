use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::shared::{
    ensure_dest_dir, ensure_parent_dir, extract_blocking_impl, extraction_failed,
};

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
    ) -> Result<Option<PathBuf>> {
        // enclosed_name rejects absolute paths and any `..` escape
        let file_path = match file.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(?archive_path, entry = file.name(), "skipping entry with unsafe path");
                return Ok(None);
            }
        };

        if file.is_dir() {
            std::fs::create_dir_all(&file_path).map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to create directory: {}", e),
                ))
            })?;
            return Ok(None);
        }

        ensure_parent_dir(&file_path)?;

        let mut outfile = std::fs::File::create(&file_path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create output file: {}", e),
            ))
        })?;

        std::io::copy(&mut file, &mut outfile).map_err(|e| {
            extraction_failed(archive_path, format!("failed to extract {}: {}", file.name(), e))
        })?;

        Ok(Some(file_path))
    }

    /// Extract every entry of a ZIP archive into `dest_path`
    pub fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        ensure_dest_dir(dest_path)?;

        let file = std::fs::File::open(archive_path)?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| {
            extraction_failed(archive_path, format!("failed to read ZIP archive: {}", e))
        })?;

        let mut extracted_files = Vec::new();

        for i in 0..archive.len() {
            let file = archive.by_index(i).map_err(|e| {
                extraction_failed(archive_path, format!("failed to read ZIP entry {}: {}", i, e))
            })?;

            if let Some(file_path) = Self::extract_zip_entry(file, dest_path, archive_path)? {
                extracted_files.push(file_path);
            }
        }

        Ok(extracted_files)
    }

    /// Extract a ZIP archive without blocking the runtime
    pub async fn extract_async(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_blocking_impl("ZIP", Self::extract, archive_path, dest_path).await
    }
}
