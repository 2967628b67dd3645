//! Acquisition of the source archive into a run's scratch directory

use crate::config::DownloadConfig;
use crate::error::{Error, ExtractionError, PipelineError, Result};
use crate::inspector::{ArchiveKind, archive_kind_from_name};
use crate::utils::{extract_filename_from_response, sanitize_file_name};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Name given to a source whose name cannot be determined
const FALLBACK_SOURCE_NAME: &str = "source";

/// Where a run's input archive comes from
#[derive(Clone, Debug)]
pub enum Source {
    /// Fetch with an HTTP GET
    Url(String),
    /// Copy from the local filesystem; the original is left untouched
    Path(PathBuf),
    /// In-memory upload, with its client-supplied file name if any
    Bytes {
        /// Original file name
        name: Option<String>,
        /// Archive contents
        data: Vec<u8>,
    },
}

impl Source {
    /// Short description for logs and task messages
    pub fn describe(&self) -> String {
        match self {
            Source::Url(url) => url.clone(),
            Source::Path(path) => path.display().to_string(),
            Source::Bytes { name, data } => format!(
                "upload {} ({} bytes)",
                name.as_deref().unwrap_or(FALLBACK_SOURCE_NAME),
                data.len()
            ),
        }
    }
}

/// The source archive staged on disk
#[derive(Debug)]
pub(crate) struct Acquired {
    pub path: PathBuf,
    pub kind: ArchiveKind,
}

fn download_error(url: &str, reason: impl std::fmt::Display) -> Error {
    Error::Pipeline(PipelineError::Download {
        url: url.to_string(),
        reason: reason.to_string(),
    })
}

fn staged_name(name: Option<&str>) -> String {
    name.and_then(sanitize_file_name)
        .unwrap_or_else(|| FALLBACK_SOURCE_NAME.to_string())
}

/// Stage `source` inside `dir` and determine its archive kind
///
/// The kind comes from the file name when it carries an archive extension,
/// otherwise from the file's magic bytes. Anything that is not a zip, tar,
/// gzip or rar archive is rejected.
pub(crate) async fn acquire(source: Source, download: &DownloadConfig, dir: &Path) -> Result<Acquired> {
    tokio::fs::create_dir_all(dir).await?;

    let path = match source {
        Source::Url(url) => fetch(&url, download, dir).await?,
        Source::Path(original) => {
            let name = original.file_name().map(|n| n.to_string_lossy().into_owned());
            let staged = dir.join(staged_name(name.as_deref()));
            tokio::fs::copy(&original, &staged).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to read source {}: {}", original.display(), e),
                ))
            })?;
            staged
        }
        Source::Bytes { name, data } => {
            let staged = dir.join(staged_name(name.as_deref()));
            tokio::fs::write(&staged, &data).await?;
            staged
        }
    };

    let kind = detect_kind(&path).await?;
    info!(?path, ?kind, "source archive acquired");
    Ok(Acquired { path, kind })
}

async fn detect_kind(path: &Path) -> Result<ArchiveKind> {
    if let Some(kind) = archive_kind_from_name(path) {
        return Ok(kind);
    }

    let owned = path.to_path_buf();
    let sniffed = tokio::task::spawn_blocking(move || infer::get_from_path(&owned))
        .await
        .map_err(|e| Error::Other(format!("file type detection panicked: {}", e)))??;

    debug!(?path, sniffed = ?sniffed.as_ref().map(|t| t.mime_type()), "sniffed source type");

    let kind = sniffed.and_then(|t| match t.extension() {
        "zip" => Some(ArchiveKind::Zip),
        "tar" => Some(ArchiveKind::Tar),
        "gz" => Some(ArchiveKind::TarGz),
        "rar" => Some(ArchiveKind::Rar),
        _ => None,
    });

    kind.ok_or_else(|| {
        Error::Extraction(ExtractionError::NotAnArchive {
            path: path.to_path_buf(),
        })
    })
}

/// Stream a URL to disk, enforcing the optional size cap
async fn fetch(url: &str, download: &DownloadConfig, dir: &Path) -> Result<PathBuf> {
    let client = reqwest::Client::builder()
        .timeout(download.timeout)
        .build()?;

    let mut response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            download_error(url, format!("timed out after {}s", download.timeout.as_secs()))
        } else if e.is_connect() {
            download_error(url, format!("connection failed: {}", e))
        } else {
            download_error(url, e)
        }
    })?;

    if !response.status().is_success() {
        return Err(download_error(url, format!("HTTP {}", response.status())));
    }

    if let (Some(limit), Some(length)) = (download.max_bytes, response.content_length()) {
        if length > limit {
            return Err(download_error(
                url,
                format!("source is {} bytes, limit is {}", length, limit),
            ));
        }
    }

    let name = extract_filename_from_response(response.headers(), url);
    let path = dir.join(staged_name(name.as_deref()));
    let mut file = tokio::fs::File::create(&path).await?;
    let mut received: u64 = 0;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| download_error(url, format!("failed to read body: {}", e)))?
    {
        received += chunk.len() as u64;
        if let Some(limit) = download.max_bytes {
            if received > limit {
                return Err(download_error(
                    url,
                    format!("source exceeds the {} byte limit", limit),
                ));
            }
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    debug!(url, ?path, bytes = received, "source downloaded");
    Ok(path)
}
