//! File classification
//!
//! Every file found after unpacking is tagged with exactly one [`FileClass`].
//! Classification is a pure function of the file's path and size, so the
//! same file always lands in the same bucket within a run.

use crate::utils::lowercase_extension;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

/// Directory created by macOS Finder when zipping, holds resource forks
const MACOS_ARCHIVE_DIR: &str = "__MACOSX";

/// Prefix of AppleDouble resource-fork files
const MACOS_RESOURCE_FORK_PREFIX: &str = "._";

/// Finder folder-metadata file
const MACOS_FOLDER_METADATA: &str = ".DS_Store";

/// Archive formats the expander can decode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// ZIP archive (.zip)
    Zip,
    /// Uncompressed tarball (.tar)
    Tar,
    /// Gzip-compressed tarball (.tar.gz, .tgz)
    TarGz,
    /// RAR archive (.rar)
    Rar,
}

/// Document formats the normalizer knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Portable Document Format
    Pdf,
    /// Legacy Word binary document
    Doc,
    /// Office Open XML word processing document
    Docx,
    /// Plain text
    Txt,
    /// Rich Text Format
    Rtf,
    /// OpenDocument text
    Odt,
}

/// Raster image formats the normalizer knows about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    /// JPEG (.jpg, .jpeg)
    Jpeg,
    /// Portable Network Graphics
    Png,
    /// Graphics Interchange Format
    Gif,
    /// Windows bitmap
    Bmp,
    /// Tagged Image File Format (.tiff, .tif)
    Tiff,
    /// WebP
    Webp,
}

/// Classification of one file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(tag = "class", content = "kind", rename_all = "snake_case")]
pub enum FileClass {
    /// Container to be expanded
    Archive(ArchiveKind),
    /// Convertible document
    Document(DocumentKind),
    /// Convertible image
    Image(ImageKind),
    /// OS metadata or placeholder, never processed
    SystemArtifact,
    /// Anything else, silently skipped
    Unsupported,
}

impl FileClass {
    /// Whether the normalizer should be invoked for this class
    pub fn is_convertible(&self) -> bool {
        matches!(self, FileClass::Document(_) | FileClass::Image(_))
    }
}

/// Archive kind from a file name, checking compound suffixes first
pub fn archive_kind_from_name(path: &Path) -> Option<ArchiveKind> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if name.ends_with(".tar.gz") {
        return Some(ArchiveKind::TarGz);
    }
    match lowercase_extension(path).as_str() {
        "zip" => Some(ArchiveKind::Zip),
        "tar" => Some(ArchiveKind::Tar),
        "tgz" => Some(ArchiveKind::TarGz),
        "rar" => Some(ArchiveKind::Rar),
        _ => None,
    }
}

fn document_kind(extension: &str) -> Option<DocumentKind> {
    match extension {
        "pdf" => Some(DocumentKind::Pdf),
        "doc" => Some(DocumentKind::Doc),
        "docx" => Some(DocumentKind::Docx),
        "txt" => Some(DocumentKind::Txt),
        "rtf" => Some(DocumentKind::Rtf),
        "odt" => Some(DocumentKind::Odt),
        _ => None,
    }
}

fn image_kind(extension: &str) -> Option<ImageKind> {
    match extension {
        "jpg" | "jpeg" => Some(ImageKind::Jpeg),
        "png" => Some(ImageKind::Png),
        "gif" => Some(ImageKind::Gif),
        "bmp" => Some(ImageKind::Bmp),
        "tiff" | "tif" => Some(ImageKind::Tiff),
        "webp" => Some(ImageKind::Webp),
        _ => None,
    }
}

/// Whether a path is macOS extraction noise, independent of its size
pub fn is_macos_artifact(path: &Path) -> bool {
    if path
        .components()
        .any(|c| c.as_os_str() == MACOS_ARCHIVE_DIR)
    {
        return true;
    }

    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.starts_with(MACOS_RESOURCE_FORK_PREFIX) || name == MACOS_FOLDER_METADATA,
        None => false,
    }
}

/// Classify a file by path and size
///
/// Rules apply in order: macOS artifacts, then files below `min_size` bytes
/// (a `min_size` of 0 disables that rule), then archive, document and image
/// extensions. Everything else is [`FileClass::Unsupported`].
pub fn classify(path: &Path, size: u64, min_size: u64) -> FileClass {
    if is_macos_artifact(path) || size < min_size {
        return FileClass::SystemArtifact;
    }

    if let Some(kind) = archive_kind_from_name(path) {
        return FileClass::Archive(kind);
    }

    let extension = lowercase_extension(path);
    if let Some(kind) = document_kind(&extension) {
        return FileClass::Document(kind);
    }
    if let Some(kind) = image_kind(&extension) {
        return FileClass::Image(kind);
    }

    FileClass::Unsupported
}

/// A file discovered during traversal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileNode {
    /// Absolute or root-relative location on disk
    pub path: PathBuf,
    /// Lowercased extension, empty if none
    pub extension: String,
    /// Size in bytes
    pub size: u64,
    /// Classification tag
    pub class: FileClass,
}

impl FileNode {
    /// Stat and classify a file
    ///
    /// A file whose metadata cannot be read is reported as a
    /// [`FileClass::SystemArtifact`] of size 0.
    pub fn inspect(path: &Path, min_size: u64) -> Self {
        let (size, class) = match std::fs::metadata(path) {
            Ok(meta) => (meta.len(), classify(path, meta.len(), min_size)),
            Err(_) => (0, FileClass::SystemArtifact),
        };

        Self {
            path: path.to_path_buf(),
            extension: lowercase_extension(path),
            size,
            class,
        }
    }

    /// Base file name for logs and text delimiters
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
