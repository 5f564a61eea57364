//! Upload boundary: turn a path, URL or byte buffer into a local PDF file.
//!
//! pdfium opens documents from the file system, so URL downloads and
//! in-memory uploads are spilled into a `TempDir` that lives exactly as long
//! as the [`ResolvedInput`]. Every source is checked for the `%PDF` magic
//! before it reaches pdfium; anything else is rejected as an invalid file
//! type.

use crate::error::GradesheetError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF ready for the document source.
#[derive(Debug)]
pub enum ResolvedInput {
    /// The caller's own file.
    Local(PathBuf),
    /// A downloaded or uploaded document; removed when dropped.
    Spilled { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Spilled { path, .. } => path,
        }
    }
}

/// Whether the input names an HTTP(S) resource.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a user-supplied path or URL.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, GradesheetError> {
    if input.trim().is_empty() {
        return Err(GradesheetError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))
    }
}

/// Spill an uploaded document to a temp file.
///
/// `name` is only used for the temp file name and error messages.
pub fn resolve_bytes(name: &str, bytes: &[u8]) -> Result<ResolvedInput, GradesheetError> {
    let file_name = sanitize_file_name(name);
    let temp_dir = TempDir::new().map_err(|e| GradesheetError::Internal(e.to_string()))?;
    let path = temp_dir.path().join(file_name);

    check_magic(&path, bytes)?;
    std::fs::write(&path, bytes)
        .map_err(|e| GradesheetError::Internal(format!("Failed to write upload: {e}")))?;

    debug!("Spilled {} byte upload to {}", bytes.len(), path.display());
    Ok(ResolvedInput::Spilled {
        path,
        _temp_dir: temp_dir,
    })
}

fn resolve_local(path: &Path) -> Result<ResolvedInput, GradesheetError> {
    let path = path.to_path_buf();
    if !path.exists() {
        return Err(GradesheetError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(GradesheetError::PermissionDenied { path });
        }
        Err(_) => return Err(GradesheetError::FileNotFound { path }),
    };

    let mut head = Vec::with_capacity(PDF_MAGIC.len());
    file.by_ref()
        .take(PDF_MAGIC.len() as u64)
        .read_to_end(&mut head)
        .map_err(|e| GradesheetError::Internal(format!("Failed to read '{}': {e}", path.display())))?;
    check_magic(&path, &head)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, GradesheetError> {
    info!("Downloading result sheet from {}", url);

    let failed = |reason: String| GradesheetError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            GradesheetError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    let resolved = resolve_bytes(&file_name_from_url(url), &bytes)?;

    info!("Downloaded {} bytes to {}", bytes.len(), resolved.path().display());
    Ok(resolved)
}

/// A PDF shorter than its magic is treated as the wrong type too.
fn check_magic(path: &Path, head: &[u8]) -> Result<(), GradesheetError> {
    if head.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Err(GradesheetError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    })
}

fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| last.contains('.'))
        .unwrap_or_else(|| "results.pdf".to_string())
}

fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if base.is_empty() {
        "upload.pdf".to_string()
    } else {
        base.to_string()
    }
}
