//! Traits for the external tools behind document conversion

use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Output format requested from the office converter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfficeTarget {
    /// Render the document to PDF
    Pdf,
    /// Export the document's plain text
    Text,
}

impl OfficeTarget {
    /// File extension the converter writes for this target
    pub fn extension(&self) -> &'static str {
        match self {
            OfficeTarget::Pdf => "pdf",
            OfficeTarget::Text => "txt",
        }
    }
}

/// Headless office-document converter
///
/// Converts word-processing documents (doc, docx, rtf, odt, txt) into PDF
/// or plain text. The converter writes `<input stem>.<ext>` into `out_dir`
/// and returns that path.
///
/// # Examples
///
/// ```no_run
/// use docbundle::conversion::{CliOfficeConverter, OfficeConverter, OfficeTarget};
/// use std::path::Path;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let converter = CliOfficeConverter::from_path(Duration::from_secs(120))
///     .expect("soffice not found");
///
/// let pdf = converter
///     .convert(Path::new("letter.docx"), Path::new("/tmp/out"), OfficeTarget::Pdf)
///     .await?;
/// println!("wrote {}", pdf.display());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait OfficeConverter: Send + Sync {
    /// Convert `input` into `target`, writing into `out_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, exits unsuccessfully,
    /// exceeds its time bound, or exits cleanly without writing the output.
    async fn convert(
        &self,
        input: &Path,
        out_dir: &Path,
        target: OfficeTarget,
    ) -> crate::Result<PathBuf>;

    /// Whether calls can succeed at all
    fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Optical character recognition engine
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize the text in a decoded image file
    ///
    /// `languages` uses tesseract syntax, e.g. `eng+rus`.
    async fn recognize(&self, image: &Path, languages: &str) -> crate::Result<String>;

    /// Whether calls can succeed at all
    fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Renders PDF pages to raster images
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Render every page of `pdf` at `dpi` into `out_dir`
    ///
    /// Returns the page images in page order.
    async fn rasterize(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> crate::Result<Vec<PathBuf>>;

    /// Whether calls can succeed at all
    fn is_available(&self) -> bool;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
