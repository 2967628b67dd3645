//! No-op tools for graceful degradation

use super::traits::{OcrEngine, OfficeConverter, OfficeTarget, PageRasterizer};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Office converter used when no `soffice` binary is available
///
/// Every call fails with `Error::NotSupported`; PDF and image inputs in PDF
/// mode, and txt/docx/image inputs in text mode, still convert without it.
///
/// # Examples
///
/// ```
/// use docbundle::conversion::{NoOpOfficeConverter, OfficeConverter, OfficeTarget};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() {
/// let converter = NoOpOfficeConverter;
/// let result = converter
///     .convert(Path::new("a.docx"), Path::new("/tmp"), OfficeTarget::Pdf)
///     .await;
/// assert!(result.is_err());
/// assert!(!converter.is_available());
/// # }
/// ```
pub struct NoOpOfficeConverter;

#[async_trait]
impl OfficeConverter for NoOpOfficeConverter {
    async fn convert(
        &self,
        _input: &Path,
        _out_dir: &Path,
        _target: OfficeTarget,
    ) -> crate::Result<PathBuf> {
        Err(crate::Error::NotSupported(
            "office document conversion requires LibreOffice. \
             Configure soffice_path in config or ensure soffice is in PATH."
                .into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// OCR engine used when no `tesseract` binary is available
pub struct NoOpOcrEngine;

#[async_trait]
impl OcrEngine for NoOpOcrEngine {
    async fn recognize(&self, _image: &Path, _languages: &str) -> crate::Result<String> {
        Err(crate::Error::NotSupported(
            "OCR requires tesseract. \
             Configure tesseract_path in config or ensure tesseract is in PATH."
                .into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

/// Page rasterizer used when no `pdftoppm` binary is available
pub struct NoOpPageRasterizer;

#[async_trait]
impl PageRasterizer for NoOpPageRasterizer {
    async fn rasterize(
        &self,
        _pdf: &Path,
        _out_dir: &Path,
        _dpi: u32,
    ) -> crate::Result<Vec<PathBuf>> {
        Err(crate::Error::NotSupported(
            "PDF rasterization requires poppler's pdftoppm. \
             Configure pdftoppm_path in config or ensure pdftoppm is in PATH."
                .into(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
