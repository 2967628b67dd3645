//! Utility functions for file operations and path manipulation

use crate::error::{Error, Result};
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use std::path::{Component, Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Get a path that does not exist yet by appending ` (n)` to the stem
///
/// # Examples
///
/// ```
/// use docbundle::utils::get_unique_path;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/report.pdf");
/// let unique = get_unique_path(path).unwrap();
/// // If /tmp/report.pdf exists, returns /tmp/report (1).pdf
/// // If that exists too, returns /tmp/report (2).pdf, etc.
/// ```
pub fn get_unique_path(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Ok(path.to_path_buf());
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Other(format!("cannot extract file stem from {}", path.display())))?;

    let extension = path.extension().and_then(|e| e.to_str());

    let parent = path.parent().ok_or_else(|| {
        Error::Other(format!(
            "cannot extract parent directory from {}",
            path.display()
        ))
    })?;

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let new_name = match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        };
        let new_path = parent.join(new_name);
        if !new_path.exists() {
            return Ok(new_path);
        }
    }

    Err(Error::Other(format!(
        "could not find unique filename for {} after {MAX_RENAME_ATTEMPTS} attempts",
        path.display()
    )))
}

/// Reduce an untrusted name to a single safe path component
///
/// Strips any directory part, rejects `.`/`..` and empty names.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    match Path::new(last).components().next() {
        Some(Component::Normal(part)) => part.to_str().map(str::to_string),
        _ => None,
    }
}

/// Lowercased extension of a path, or an empty string
pub fn lowercase_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Path of `path` relative to `root`, falling back to `path` itself
pub fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Extract a file name (with extension) for a downloaded source
///
/// Tries the Content-Disposition header first (`filename=` then RFC 5987
/// `filename*=`), falls back to the last URL path segment.
pub fn extract_filename_from_response(headers: &HeaderMap, url: &str) -> Option<String> {
    if let Some(content_disposition) = headers.get(CONTENT_DISPOSITION)
        && let Ok(value) = content_disposition.to_str()
    {
        for part in value.split(';') {
            let part = part.trim();
            if let Some(filename) = part.strip_prefix("filename=") {
                if let Some(name) = sanitize_file_name(filename.trim_matches('"')) {
                    return Some(name);
                }
            } else if let Some(filename) = part.strip_prefix("filename*=") {
                // charset'lang'encoded-filename
                if let Some(idx) = filename.rfind('\'')
                    && let Ok(decoded) = urlencoding::decode(&filename[idx + 1..])
                    && let Some(name) = sanitize_file_name(&decoded)
                {
                    return Some(name);
                }
            }
        }
    }

    if let Ok(parsed_url) = url::Url::parse(url)
        && let Some(mut segments) = parsed_url.path_segments()
        && let Some(last_segment) = segments.next_back()
        && !last_segment.is_empty()
    {
        let decoded = urlencoding::decode(last_segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| last_segment.to_string());
        return sanitize_file_name(&decoded);
    }

    None
}
