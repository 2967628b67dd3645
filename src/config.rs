//! Configuration types for docbundle

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Main configuration for [`DocumentExtractor`](crate::DocumentExtractor)
///
/// Fields are organized into sub-configs, one per pipeline concern:
/// - [`inspection`](InspectionConfig) - file classification thresholds
/// - [`extraction`](ExtractionConfig) - recursive unpack limits
/// - [`conversion`](ConversionConfig) - OCR languages and raster resolutions
/// - [`tools`](ToolsConfig) - external binary paths and timeouts
/// - [`download`](DownloadConfig) - source archive fetching
/// - [`api`](ApiConfig) - REST server settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Root for scratch directories and per-task output directories (default: "./work")
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// File classification settings
    #[serde(default)]
    pub inspection: InspectionConfig,

    /// Recursive archive expansion settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Per-file conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// External tool paths and limits
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Source download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            inspection: InspectionConfig::default(),
            extraction: ExtractionConfig::default(),
            conversion: ConversionConfig::default(),
            tools: ToolsConfig::default(),
            download: DownloadConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

impl Config {
    /// Output directory for a task: `<work_dir>/extracted_documents_<task_id>`
    pub fn output_dir_for(&self, task_id: &crate::types::TaskId) -> PathBuf {
        self.work_dir.join(format!("extracted_documents_{task_id}"))
    }

    /// Check settings that serde cannot enforce on its own
    pub fn validate(&self) -> crate::Result<()> {
        if self.extraction.max_depth == 0 {
            return Err(crate::Error::Config {
                message: "max_depth must be at least 1".into(),
                key: Some("extraction.max_depth".into()),
            });
        }
        if self.conversion.image_dpi == 0 || self.conversion.rasterize_dpi == 0 {
            return Err(crate::Error::Config {
                message: "dpi values must be positive".into(),
                key: Some("conversion".into()),
            });
        }
        if self.conversion.ocr_languages.trim().is_empty() {
            return Err(crate::Error::Config {
                message: "ocr_languages must not be empty".into(),
                key: Some("conversion.ocr_languages".into()),
            });
        }
        if self.tools.timeout.is_zero() {
            return Err(crate::Error::Config {
                message: "tool timeout must be greater than zero".into(),
                key: Some("tools.timeout".into()),
            });
        }
        Ok(())
    }
}

/// File classification settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct InspectionConfig {
    /// Files smaller than this many bytes are treated as system artifacts (default: 100, 0 disables)
    #[serde(default = "default_min_file_size")]
    pub min_file_size: u64,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            min_file_size: default_min_file_size(),
        }
    }
}

/// Recursive archive expansion settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractionConfig {
    /// Maximum nesting depth of archives inside archives (default: 32)
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// Per-file conversion settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ConversionConfig {
    /// Tesseract language set (default: "eng+rus")
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: String,

    /// Resolution used to size image pages when wrapping images into PDF (default: 100)
    #[serde(default = "default_image_dpi")]
    pub image_dpi: u32,

    /// Resolution used when rasterizing PDF pages for OCR (default: 200)
    #[serde(default = "default_rasterize_dpi")]
    pub rasterize_dpi: u32,

    /// Sort discovered files by relative path before converting (default: true)
    #[serde(default = "default_true")]
    pub sort_discovered: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            ocr_languages: default_ocr_languages(),
            image_dpi: default_image_dpi(),
            rasterize_dpi: default_rasterize_dpi(),
            sort_discovered: true,
        }
    }
}

/// External tool paths (soffice, tesseract, pdftoppm) and limits
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ToolsConfig {
    /// Path to the LibreOffice `soffice` executable (auto-detected if None)
    #[serde(default)]
    pub soffice_path: Option<PathBuf>,

    /// Path to the `tesseract` executable (auto-detected if None)
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,

    /// Path to the poppler `pdftoppm` executable (auto-detected if None)
    #[serde(default)]
    pub pdftoppm_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Upper bound for a single tool invocation, in seconds (default: 120)
    #[serde(default = "default_tool_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            soffice_path: None,
            tesseract_path: None,
            pdftoppm_path: None,
            search_path: true,
            timeout: default_tool_timeout(),
        }
    }
}

/// Source download settings
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Whole-request timeout for fetching a source archive, in seconds (default: 300)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,

    /// Reject sources larger than this many bytes (None = unlimited)
    #[serde(default)]
    pub max_bytes: Option<u64>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout: default_download_timeout(),
            max_bytes: None,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("./work")
}

fn default_min_file_size() -> u64 {
    100
}

fn default_max_depth() -> u32 {
    32
}

fn default_ocr_languages() -> String {
    "eng+rus".to_string()
}

fn default_image_dpi() -> u32 {
    100
}

fn default_rasterize_dpi() -> u32 {
    200
}

fn default_tool_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// Durations travel as whole seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
