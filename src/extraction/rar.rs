use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::shared::{
    ensure_dest_dir, ensure_parent_dir, extract_blocking_impl, extraction_failed,
    sanitize_entry_path,
};

/// Archive extractor for RAR files
pub struct RarExtractor;

impl RarExtractor {
    fn convert_unrar_error(e: unrar::error::UnrarError, archive_path: &Path) -> Error {
        extraction_failed(archive_path, e.to_string())
    }

    /// Extract every entry of a RAR archive into `dest_path`
    ///
    /// Encrypted archives fail like corrupt ones; no password is ever tried.
    pub fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting RAR extraction");

        ensure_dest_dir(dest_path)?;

        let processor = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(|e| Self::convert_unrar_error(e, archive_path))?;

        let mut extracted_files = Vec::new();

        // Header/file state machine: read_header moves to BeforeFile, then
        // extract_to or skip moves back to BeforeHeader
        let mut at_header = processor;
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry_processor)) => entry_processor,
                Ok(None) => break,
                Err(e) => return Err(Self::convert_unrar_error(e, archive_path)),
            };

            let header = at_file.entry();

            let sanitized = match sanitize_entry_path(&header.filename) {
                Some(path) if !header.is_directory() => path,
                _ => {
                    at_header = at_file.skip().map_err(|e| {
                        extraction_failed(archive_path, format!("failed to skip entry: {}", e))
                    })?;
                    continue;
                }
            };

            let file_path = dest_path.join(&sanitized);
            ensure_parent_dir(&file_path)?;

            at_header = at_file
                .extract_to(&file_path)
                .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
            extracted_files.push(file_path);
        }

        Ok(extracted_files)
    }

    /// Extract a RAR archive without blocking the runtime
    pub async fn extract_async(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        extract_blocking_impl("RAR", Self::extract, archive_path, dest_path).await
    }
}
