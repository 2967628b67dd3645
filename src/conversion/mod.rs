//! Per-file format normalization
//!
//! The [`Normalizer`] turns one classified file into an artifact in the
//! run's target representation, dispatching on `(OutputMode, FileClass)`:
//!
//! | mode | source | action |
//! |------|--------|--------|
//! | pdf  | pdf | pass through |
//! | pdf  | image | wrap into a one-page PDF (RGB) |
//! | pdf  | doc, docx, rtf, odt, txt | office converter |
//! | txt  | txt | pass through |
//! | txt  | image | OCR |
//! | txt  | docx | read the document XML directly |
//! | txt  | doc | office converter, text export |
//! | txt  | pdf | rasterize every page, OCR each, concatenate |
//!
//! Everything else is an `unsupported format` failure. Failures are returned
//! inside the [`ConversionResult`], never raised, so one file cannot stop
//! its siblings.
//!
//! External tools sit behind the [`OfficeConverter`], [`OcrEngine`] and
//! [`PageRasterizer`] traits; [`Toolchain::from_config`] picks the CLI
//! implementation when the binary is available and a no-op otherwise.

mod cli;
mod image;
mod noop;
mod text;
mod toolchain;
mod traits;

pub use cli::{CliOcrEngine, CliOfficeConverter, CliPageRasterizer};
pub use image::{image_to_pdf, image_to_png};
pub use noop::{NoOpOcrEngine, NoOpOfficeConverter, NoOpPageRasterizer};
pub use text::docx_text;
pub use toolchain::Toolchain;
pub use traits::{OcrEngine, OfficeConverter, OfficeTarget, PageRasterizer};

use crate::config::ConversionConfig;
use crate::error::{ConversionError, Error};
use crate::inspector::{DocumentKind, FileClass, FileNode};
use crate::types::OutputMode;
use crate::utils::get_unique_path;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

/// Outcome of normalizing one file, paired with its source
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// The file that was normalized
    pub source: FileNode,
    /// Artifact path, or why there is none
    pub outcome: Result<PathBuf, ConversionError>,
}

impl ConversionResult {
    /// Artifact path if conversion succeeded
    pub fn artifact(&self) -> Option<&Path> {
        self.outcome.as_ref().ok().map(PathBuf::as_path)
    }
}

/// Converts classified files into PDF or text artifacts
pub struct Normalizer {
    toolchain: Toolchain,
    settings: ConversionConfig,
}

/// Fold a tool error into the per-file error type
fn tool_error(tool: &str, path: &Path, error: Error) -> ConversionError {
    match error {
        Error::Conversion(e) => e,
        other => ConversionError::ToolFailed {
            tool: tool.to_string(),
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

fn unsupported(node: &FileNode) -> ConversionError {
    ConversionError::UnsupportedFormat {
        path: node.path.clone(),
        extension: node.extension.clone(),
    }
}

fn panicked(node: &FileNode, e: tokio::task::JoinError) -> ConversionError {
    ConversionError::Text {
        path: node.path.clone(),
        reason: format!("conversion task panicked: {}", e),
    }
}

impl Normalizer {
    /// Create a normalizer over a toolchain
    pub fn new(toolchain: Toolchain, settings: ConversionConfig) -> Self {
        Self {
            toolchain,
            settings,
        }
    }

    /// Convert one file into `mode`, writing any new artifact into `out_dir`
    ///
    /// Artifact names never collide: a second `report.pdf` becomes
    /// `report (1).pdf`. Tools write into a private staging directory under
    /// `out_dir` which is removed before returning.
    pub async fn normalize(
        &self,
        node: &FileNode,
        mode: OutputMode,
        out_dir: &Path,
    ) -> ConversionResult {
        let outcome = self.convert(node, mode, out_dir).await;

        match &outcome {
            Ok(artifact) => debug!(source = ?node.path, ?artifact, %mode, "file normalized"),
            Err(e) => warn!(source = ?node.path, error = %e, %mode, "failed to normalize file"),
        }

        ConversionResult {
            source: node.clone(),
            outcome,
        }
    }

    async fn convert(
        &self,
        node: &FileNode,
        mode: OutputMode,
        out_dir: &Path,
    ) -> Result<PathBuf, ConversionError> {
        match (mode, node.class) {
            (OutputMode::Pdf, FileClass::Document(DocumentKind::Pdf)) => Ok(node.path.clone()),
            (OutputMode::Pdf, FileClass::Image(_)) => self.image_to_pdf(node, out_dir).await,
            (
                OutputMode::Pdf,
                FileClass::Document(
                    DocumentKind::Doc
                    | DocumentKind::Docx
                    | DocumentKind::Rtf
                    | DocumentKind::Odt
                    | DocumentKind::Txt,
                ),
            ) => self.office(node, out_dir, OfficeTarget::Pdf).await,

            (OutputMode::Text, FileClass::Document(DocumentKind::Txt)) => Ok(node.path.clone()),
            (OutputMode::Text, FileClass::Image(_)) => self.image_to_text(node, out_dir).await,
            (OutputMode::Text, FileClass::Document(DocumentKind::Docx)) => {
                self.docx_to_text(node, out_dir).await
            }
            (OutputMode::Text, FileClass::Document(DocumentKind::Doc)) => {
                self.office(node, out_dir, OfficeTarget::Text).await
            }
            (OutputMode::Text, FileClass::Document(DocumentKind::Pdf)) => {
                self.pdf_to_text(node, out_dir).await
            }
            (OutputMode::Text, FileClass::Document(DocumentKind::Rtf | DocumentKind::Odt)) => {
                Err(unsupported(node))
            }

            (_, FileClass::Archive(_) | FileClass::SystemArtifact | FileClass::Unsupported) => {
                Err(unsupported(node))
            }
        }
    }

    /// Unique destination for `<source stem>.<ext>` in `out_dir`
    fn artifact_path(node: &FileNode, out_dir: &Path, extension: &str) -> Result<PathBuf, ConversionError> {
        let stem = node
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        get_unique_path(&out_dir.join(format!("{stem}.{extension}"))).map_err(|e| {
            ConversionError::Text {
                path: node.path.clone(),
                reason: e.to_string(),
            }
        })
    }

    fn staging_dir(node: &FileNode, out_dir: &Path) -> Result<TempDir, ConversionError> {
        tempfile::Builder::new()
            .prefix(".staging_")
            .tempdir_in(out_dir)
            .map_err(|e| ConversionError::Text {
                path: node.path.clone(),
                reason: format!("failed to create staging directory: {}", e),
            })
    }

    async fn image_to_pdf(&self, node: &FileNode, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let output = Self::artifact_path(node, out_dir, "pdf")?;
        let source = node.path.clone();
        let target = output.clone();
        let dpi = self.settings.image_dpi;

        spawn_blocking(move || image_to_pdf(&source, &target, dpi))
            .await
            .map_err(|e| panicked(node, e))??;

        Ok(output)
    }

    async fn office(
        &self,
        node: &FileNode,
        out_dir: &Path,
        target: OfficeTarget,
    ) -> Result<PathBuf, ConversionError> {
        let staging = Self::staging_dir(node, out_dir)?;

        let produced = self
            .toolchain
            .office
            .convert(&node.path, staging.path(), target)
            .await
            .map_err(|e| tool_error(self.toolchain.office.name(), &node.path, e))?;

        let output = Self::artifact_path(node, out_dir, target.extension())?;
        tokio::fs::rename(&produced, &output)
            .await
            .map_err(|e| ConversionError::Text {
                path: node.path.clone(),
                reason: format!("failed to move converted file: {}", e),
            })?;

        Ok(output)
    }

    async fn image_to_text(&self, node: &FileNode, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let staging = Self::staging_dir(node, out_dir)?;

        // Tesseract builds differ in what they decode; hand it a plain RGB PNG
        let stem = node
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let png = staging.path().join(format!("{stem}.png"));
        let source = node.path.clone();
        let target = png.clone();
        spawn_blocking(move || image_to_png(&source, &target))
            .await
            .map_err(|e| panicked(node, e))??;

        let text = self
            .toolchain
            .ocr
            .recognize(&png, &self.settings.ocr_languages)
            .await
            .map_err(|e| tool_error(self.toolchain.ocr.name(), &node.path, e))?;

        let output = Self::artifact_path(node, out_dir, "txt")?;
        text::write_text(&node.path, &output, &text).await?;
        Ok(output)
    }

    async fn docx_to_text(&self, node: &FileNode, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let source = node.path.clone();
        let text = spawn_blocking(move || docx_text(&source))
            .await
            .map_err(|e| panicked(node, e))??;

        let output = Self::artifact_path(node, out_dir, "txt")?;
        text::write_text(&node.path, &output, &text).await?;
        Ok(output)
    }

    async fn pdf_to_text(&self, node: &FileNode, out_dir: &Path) -> Result<PathBuf, ConversionError> {
        let staging = Self::staging_dir(node, out_dir)?;

        let pages = self
            .toolchain
            .rasterizer
            .rasterize(&node.path, staging.path(), self.settings.rasterize_dpi)
            .await
            .map_err(|e| tool_error(self.toolchain.rasterizer.name(), &node.path, e))?;

        let mut text = String::new();
        for page in &pages {
            let page_text = self
                .toolchain
                .ocr
                .recognize(page, &self.settings.ocr_languages)
                .await
                .map_err(|e| tool_error(self.toolchain.ocr.name(), &node.path, e))?;
            text.push_str(&page_text);
        }

        debug!(source = ?node.path, pages = pages.len(), "OCR'd rasterized PDF");

        let output = Self::artifact_path(node, out_dir, "txt")?;
        text::write_text(&node.path, &output, &text).await?;
        Ok(output)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
