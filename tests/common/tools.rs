//! Stand-ins for the external conversion tools

use async_trait::async_trait;
use docbundle::conversion::{OcrEngine, OfficeConverter, OfficeTarget, PageRasterizer, Toolchain};
use docbundle::{Config, Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Renders office documents as a one-page PDF labelled with the input stem,
/// or as a line of text
pub struct FakeOffice;

#[async_trait]
impl OfficeConverter for FakeOffice {
    async fn convert(&self, input: &Path, out_dir: &Path, target: OfficeTarget) -> Result<PathBuf> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Other("input has no name".into()))?;
        let output = out_dir.join(format!("{stem}.{}", target.extension()));
        match target {
            OfficeTarget::Pdf => std::fs::write(&output, super::pdf_bytes(&[&stem]))?,
            OfficeTarget::Text => std::fs::write(&output, format!("office text of {stem}"))?,
        }
        Ok(output)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// "Recognizes" an image as its file name
pub struct FakeOcr;

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize(&self, image: &Path, languages: &str) -> Result<String> {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("ocr[{languages}] {name}\n"))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Emits one PNG per page of the input PDF
pub struct FakeRasterizer;

#[async_trait]
impl PageRasterizer for FakeRasterizer {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path, _dpi: u32) -> Result<Vec<PathBuf>> {
        let pages = lopdf::Document::load(pdf)
            .map_err(|e| Error::Other(e.to_string()))?
            .get_pages()
            .len();
        let mut out = Vec::new();
        for i in 1..=pages {
            let path = out_dir.join(format!("page-{i}.png"));
            std::fs::write(&path, super::png_bytes())?;
            out.push(path);
        }
        Ok(out)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Toolchain made of the fakes above
pub fn fake_toolchain() -> Toolchain {
    Toolchain::new(Arc::new(FakeOffice), Arc::new(FakeOcr), Arc::new(FakeRasterizer))
}

/// Config rooted in a fresh temp dir
pub fn test_config() -> (Config, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        work_dir: temp_dir.path().join("work"),
        ..Default::default()
    };
    (config, temp_dir)
}
