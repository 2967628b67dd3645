//! Text extraction helpers that need no external tool

use crate::error::ConversionError;
use std::path::Path;

fn text_error(path: &Path, reason: impl std::fmt::Display) -> ConversionError {
    ConversionError::Text {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Read the body text of a `.docx` straight from its XML parts
pub fn docx_text(path: &Path) -> Result<String, ConversionError> {
    docx_lite::extract_text(path).map_err(|e| text_error(path, e))
}

/// Write `text` as UTF-8 to `output_path`
pub async fn write_text(source: &Path, output_path: &Path, text: &str) -> Result<(), ConversionError> {
    tokio::fs::write(output_path, text.as_bytes())
        .await
        .map_err(|e| text_error(source, format!("failed to write {}: {}", output_path.display(), e)))
}
