//! Resolution of the external tool set from configuration

use super::cli::{CliOcrEngine, CliOfficeConverter, CliPageRasterizer};
use super::noop::{NoOpOcrEngine, NoOpOfficeConverter, NoOpPageRasterizer};
use super::traits::{OcrEngine, OfficeConverter, PageRasterizer};
use crate::config::ToolsConfig;
use crate::types::{Capabilities, ToolCapabilityInfo};
use std::sync::Arc;

/// The three external tools a run may call on
#[derive(Clone)]
pub struct Toolchain {
    /// Office documents to PDF or text
    pub office: Arc<dyn OfficeConverter>,
    /// Image text recognition
    pub ocr: Arc<dyn OcrEngine>,
    /// PDF pages to images
    pub rasterizer: Arc<dyn PageRasterizer>,
}

impl Toolchain {
    /// Assemble a toolchain from explicit implementations
    pub fn new(
        office: Arc<dyn OfficeConverter>,
        ocr: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        Self {
            office,
            ocr,
            rasterizer,
        }
    }

    /// A toolchain where every tool is missing
    pub fn unavailable() -> Self {
        Self::new(
            Arc::new(NoOpOfficeConverter),
            Arc::new(NoOpOcrEngine),
            Arc::new(NoOpPageRasterizer),
        )
    }

    /// Resolve each tool: explicit path, then PATH search, then no-op
    pub fn from_config(tools: &ToolsConfig) -> Self {
        let timeout = tools.timeout;

        let office: Arc<dyn OfficeConverter> = if let Some(ref path) = tools.soffice_path {
            Arc::new(CliOfficeConverter::new(path.clone(), timeout))
        } else if tools.search_path {
            CliOfficeConverter::from_path(timeout)
                .map(|c| Arc::new(c) as Arc<dyn OfficeConverter>)
                .unwrap_or_else(|| Arc::new(NoOpOfficeConverter))
        } else {
            Arc::new(NoOpOfficeConverter)
        };

        let ocr: Arc<dyn OcrEngine> = if let Some(ref path) = tools.tesseract_path {
            Arc::new(CliOcrEngine::new(path.clone(), timeout))
        } else if tools.search_path {
            CliOcrEngine::from_path(timeout)
                .map(|e| Arc::new(e) as Arc<dyn OcrEngine>)
                .unwrap_or_else(|| Arc::new(NoOpOcrEngine))
        } else {
            Arc::new(NoOpOcrEngine)
        };

        let rasterizer: Arc<dyn PageRasterizer> = if let Some(ref path) = tools.pdftoppm_path {
            Arc::new(CliPageRasterizer::new(path.clone(), timeout))
        } else if tools.search_path {
            CliPageRasterizer::from_path(timeout)
                .map(|r| Arc::new(r) as Arc<dyn PageRasterizer>)
                .unwrap_or_else(|| Arc::new(NoOpPageRasterizer))
        } else {
            Arc::new(NoOpPageRasterizer)
        };

        let toolchain = Self::new(office, ocr, rasterizer);

        tracing::info!(
            office = toolchain.office.name(),
            ocr = toolchain.ocr.name(),
            rasterizer = toolchain.rasterizer.name(),
            "conversion toolchain initialized"
        );

        toolchain
    }

    /// Report which tools are usable
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            office: ToolCapabilityInfo {
                available: self.office.is_available(),
                handler: self.office.name().to_string(),
            },
            ocr: ToolCapabilityInfo {
                available: self.ocr.is_available(),
                handler: self.ocr.name().to_string(),
            },
            rasterizer: ToolCapabilityInfo {
                available: self.rasterizer.is_available(),
                handler: self.rasterizer.name().to_string(),
            },
        }
    }
}

impl std::fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("office", &self.office.name())
            .field("ocr", &self.ocr.name())
            .field("rasterizer", &self.rasterizer.name())
            .finish()
    }
}
