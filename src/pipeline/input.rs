//! Input resolution: normalise a document reference to a local file.
//!
//! ## Why download to a temp file?
//!
//! pdfium requires a file-system path — it cannot stream from a byte
//! buffer. Downloading a URL reference to a `TempDir` gives us a path
//! pdfium can open while ensuring cleanup happens automatically when
//! `ResolvedInput` is dropped. We validate the PDF magic bytes (`%PDF`)
//! before returning so a wrong file produces a meaningful per-document
//! failure rather than a pdfium crash.
//!
//! Every error here is a [`DocumentError`]: a reference that cannot be
//! resolved fails that one document, never the batch.

use crate::error::DocumentError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input — either a local path or a downloaded temp file.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until processing completes.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the PDF regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the document reference looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// The base name used as the `filename` key on every outcome.
///
/// URL references use the last path segment; local references use the
/// file name component.
pub fn display_name(reference: &str) -> String {
    if is_url(reference) {
        return reference
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(reference)
            .to_string();
    }
    Path::new(reference)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| reference.to_string())
}

/// Resolve a document reference to a local PDF file path.
///
/// URLs are downloaded to a temporary directory; local paths are validated
/// for existence, readability, and PDF magic bytes.
pub async fn resolve_input(
    reference: &str,
    timeout_secs: u64,
) -> Result<ResolvedInput, DocumentError> {
    if is_url(reference) {
        download_url(reference, timeout_secs).await
    } else {
        resolve_local(reference)
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, DocumentError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(DocumentError::Render {
            detail: format!("File not found: {}", path.display()),
        });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(DocumentError::Render {
                    detail: format!("Not a valid PDF: {} (magic {:?})", path.display(), magic),
                });
            }
        }
        Err(e) => {
            return Err(DocumentError::Render {
                detail: format!("Cannot open {}: {}", path.display(), e),
            });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, DocumentError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocumentError::Render {
            detail: format!("Download failed for {url}: {e}"),
        })?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| DocumentError::Render {
            detail: if e.is_timeout() {
                format!("Download timed out after {timeout_secs}s for {url}")
            } else {
                format!("Download failed for {url}: {e}")
            },
        })?;

    if !response.status().is_success() {
        return Err(DocumentError::Render {
            detail: format!("Download failed for {url}: HTTP {}", response.status()),
        });
    }

    let filename = display_name(url);
    let filename = if filename.contains('.') {
        filename
    } else {
        "downloaded.pdf".to_string()
    };

    let temp_dir = TempDir::new().map_err(|e| DocumentError::Render {
        detail: format!("tempdir: {e}"),
    })?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response.bytes().await.map_err(|e| DocumentError::Render {
        detail: format!("Download failed for {url}: {e}"),
    })?;

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        return Err(DocumentError::Render {
            detail: format!("Downloaded file from {url} is not a PDF"),
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| DocumentError::Render {
            detail: format!("Failed to write temp file: {e}"),
        })?;

    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("/data/scans/donation_001.pdf"), "donation_001.pdf");
        assert_eq!(display_name("donation_001.pdf"), "donation_001.pdf");
        assert_eq!(
            display_name("https://example.com/receipts/2025/scan.pdf"),
            "scan.pdf"
        );
    }

    #[test]
    fn missing_file_is_a_document_error() {
        let result = resolve_local("/definitely/not/a/real/file.pdf");
        match result {
            Err(DocumentError::Render { detail }) => {
                assert!(detail.contains("File not found"));
            }
            other => panic!("expected Render error, got {other:?}"),
        }
    }

    #[test]
    fn non_pdf_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let result = resolve_local(path.to_str().unwrap());
        match result {
            Err(DocumentError::Render { detail }) => {
                assert!(detail.contains("Not a valid PDF"));
            }
            other => panic!("expected Render error, got {other:?}"),
        }
    }
}
