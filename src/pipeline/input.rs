//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! pdfium needs a file-system path — it cannot stream from a byte buffer.
//! URL inputs are downloaded into a `TempDir` whose lifetime is tied to the
//! returned [`SourceDocument`], so cleanup happens when the run finishes (or
//! panics) no matter how it exits. The `%PDF` magic bytes are validated
//! before rendering so callers get a meaningful error instead of a pdfium
//! crash on arbitrary bytes.

use crate::error::Pdf2TocError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input document.
#[derive(Debug)]
pub enum SourceDocument {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; the PDF lives in a temp directory that is removed
    /// when this value is dropped.
    Downloaded { path: PathBuf, _dir: TempDir },
}

impl SourceDocument {
    /// Path to the PDF regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            SourceDocument::Local(p) => p,
            SourceDocument::Downloaded { path, .. } => path,
        }
    }
}

/// Resolve an input string to a local, magic-checked PDF file.
pub async fn resolve(input: &str, timeout_secs: u64) -> Result<SourceDocument, Pdf2TocError> {
    if input.starts_with("http://") || input.starts_with("https://") {
        download(input, timeout_secs).await
    } else if input.is_empty() {
        Err(Pdf2TocError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        local(input)
    }
}

fn local(path_str: &str) -> Result<SourceDocument, Pdf2TocError> {
    let path = PathBuf::from(path_str);
    if !path.exists() {
        return Err(Pdf2TocError::FileNotFound { path });
    }

    let mut file = std::fs::File::open(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            Pdf2TocError::PermissionDenied { path: path.clone() }
        } else {
            Pdf2TocError::FileNotFound { path: path.clone() }
        }
    })?;

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(Pdf2TocError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(SourceDocument::Local(path))
}

async fn download(url: &str, timeout_secs: u64) -> Result<SourceDocument, Pdf2TocError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2TocError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2TocError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2TocError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2TocError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2TocError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let dir = TempDir::new().map_err(|e| Pdf2TocError::Internal(e.to_string()))?;
    let path = dir.path().join("input.pdf");

    // Reject non-PDF payloads before touching disk.
    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(Pdf2TocError::NotAPdf { path, magic });
    }

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Pdf2TocError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(SourceDocument::Downloaded { path, _dir: dir })
}
