//! CLI-backed tools: LibreOffice `soffice`, `tesseract` and poppler `pdftoppm`

use super::traits::{OcrEngine, OfficeConverter, OfficeTarget, PageRasterizer};
use crate::error::{ConversionError, Error};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Run one tool invocation under a time bound
///
/// The child is killed if the bound elapses. A non-zero exit is an error
/// carrying the exit status and the trimmed stderr.
async fn run_tool(
    tool: &str,
    mut command: Command,
    input: &Path,
    timeout: Duration,
) -> crate::Result<Output> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(tool, ?input, timeout_secs = timeout.as_secs(), "running external tool");

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Err(_) => {
            return Err(Error::Conversion(ConversionError::ToolTimedOut {
                tool: tool.to_string(),
                path: input.to_path_buf(),
                seconds: timeout.as_secs(),
            }));
        }
        Ok(Err(e)) => {
            return Err(Error::Conversion(ConversionError::ToolFailed {
                tool: tool.to_string(),
                path: input.to_path_buf(),
                reason: format!("failed to execute: {}", e),
            }));
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Conversion(ConversionError::ToolFailed {
            tool: tool.to_string(),
            path: input.to_path_buf(),
            reason: format!("{}: {}", output.status, stderr.trim()),
        }));
    }

    Ok(output)
}

/// LibreOffice headless converter
///
/// Each call runs with its own user profile under `out_dir`, so concurrent
/// runs never contend for the shared profile lock.
pub struct CliOfficeConverter {
    binary_path: PathBuf,
    timeout: Duration,
}

impl CliOfficeConverter {
    /// Create a converter with an explicit binary path
    pub fn new(binary_path: PathBuf, timeout: Duration) -> Self {
        Self {
            binary_path,
            timeout,
        }
    }

    /// Attempt to find `soffice` (or `libreoffice`) in PATH
    pub fn from_path(timeout: Duration) -> Option<Self> {
        which::which("soffice")
            .or_else(|_| which::which("libreoffice"))
            .ok()
            .map(|path| Self::new(path, timeout))
    }
}

#[async_trait]
impl OfficeConverter for CliOfficeConverter {
    async fn convert(
        &self,
        input: &Path,
        out_dir: &Path,
        target: OfficeTarget,
    ) -> crate::Result<PathBuf> {
        let filter = match target {
            OfficeTarget::Pdf => "pdf",
            OfficeTarget::Text => "txt:Text",
        };

        let mut command = Command::new(&self.binary_path);
        command.arg("--headless");
        if let Ok(profile) = url::Url::from_directory_path(out_dir.join(".lo_profile")) {
            command.arg(format!("-env:UserInstallation={}", profile));
        }
        command
            .arg("--convert-to")
            .arg(filter)
            .arg("--outdir")
            .arg(out_dir)
            .arg(input);

        run_tool("soffice", command, input, self.timeout).await?;

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let expected = out_dir.join(format!("{}.{}", stem, target.extension()));
        if !expected.is_file() {
            return Err(Error::Conversion(ConversionError::MissingOutput {
                tool: "soffice".to_string(),
                expected,
            }));
        }

        Ok(expected)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "cli-soffice"
    }
}

/// Tesseract OCR, reading the recognized text from stdout
pub struct CliOcrEngine {
    binary_path: PathBuf,
    timeout: Duration,
}

impl CliOcrEngine {
    /// Create an engine with an explicit binary path
    pub fn new(binary_path: PathBuf, timeout: Duration) -> Self {
        Self {
            binary_path,
            timeout,
        }
    }

    /// Attempt to find `tesseract` in PATH
    pub fn from_path(timeout: Duration) -> Option<Self> {
        which::which("tesseract")
            .ok()
            .map(|path| Self::new(path, timeout))
    }
}

#[async_trait]
impl OcrEngine for CliOcrEngine {
    async fn recognize(&self, image: &Path, languages: &str) -> crate::Result<String> {
        let mut command = Command::new(&self.binary_path);
        command.arg(image).arg("stdout").arg("-l").arg(languages);

        let output = run_tool("tesseract", command, image, self.timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "cli-tesseract"
    }
}

/// Poppler `pdftoppm`, rendering PNG pages
pub struct CliPageRasterizer {
    binary_path: PathBuf,
    timeout: Duration,
}

impl CliPageRasterizer {
    /// File name prefix of rendered pages
    const PAGE_PREFIX: &'static str = "page";

    /// Create a rasterizer with an explicit binary path
    pub fn new(binary_path: PathBuf, timeout: Duration) -> Self {
        Self {
            binary_path,
            timeout,
        }
    }

    /// Attempt to find `pdftoppm` in PATH
    pub fn from_path(timeout: Duration) -> Option<Self> {
        which::which("pdftoppm")
            .ok()
            .map(|path| Self::new(path, timeout))
    }
}

#[async_trait]
impl PageRasterizer for CliPageRasterizer {
    async fn rasterize(&self, pdf: &Path, out_dir: &Path, dpi: u32) -> crate::Result<Vec<PathBuf>> {
        let mut command = Command::new(&self.binary_path);
        command
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(out_dir.join(Self::PAGE_PREFIX));

        run_tool("pdftoppm", command, pdf, self.timeout).await?;

        // page-1.png ... or page-01.png ...; padding is uniform so a name sort is page order
        let mut pages = Vec::new();
        let mut entries = tokio::fs::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_page = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(Self::PAGE_PREFIX) && n.ends_with(".png"));
            if is_page {
                pages.push(path);
            }
        }
        pages.sort();

        if pages.is_empty() {
            return Err(Error::Conversion(ConversionError::MissingOutput {
                tool: "pdftoppm".to_string(),
                expected: out_dir.join(format!("{}-1.png", Self::PAGE_PREFIX)),
            }));
        }

        Ok(pages)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "cli-pdftoppm"
    }
}
