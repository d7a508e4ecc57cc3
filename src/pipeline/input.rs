//! Input resolution: turn a user-supplied path, `-`, or URL into bytes.
//!
//! The pipeline itself only ever sees a byte slice; this module is the
//! boundary where file system and network failures become
//! [`DocBlocksError`]s instead of error envelopes.

use crate::error::DocBlocksError;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Marker for "read from standard input".
pub const STDIN_MARKER: &str = "-";

/// A fully read input, with a label for logs and error messages.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    /// The path, `-`, or URL as given by the user.
    pub label: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read `input` fully into memory.
///
/// * `-` reads standard input to EOF.
/// * `http://` / `https://` downloads with a `timeout_secs` budget.
/// * anything else is a local file path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, DocBlocksError> {
    let bytes = if input == STDIN_MARKER {
        read_stdin().await?
    } else if is_url(input) {
        download_url(input, timeout_secs).await?
    } else if input.trim().is_empty() {
        return Err(DocBlocksError::InvalidInput {
            input: input.to_string(),
        });
    } else {
        read_local(Path::new(input)).await?
    };

    debug!("Resolved '{}' ({} bytes)", input, bytes.len());
    Ok(ResolvedInput {
        label: input.to_string(),
        bytes,
    })
}

async fn read_stdin() -> Result<Vec<u8>, DocBlocksError> {
    let mut buf = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut buf)
        .await
        .map_err(|source| DocBlocksError::ReadFailed {
            input: STDIN_MARKER.to_string(),
            source,
        })?;
    Ok(buf)
}

/// Read a local file, classifying the common failures.
pub(crate) async fn read_local(path: &Path) -> Result<Vec<u8>, DocBlocksError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(DocBlocksError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            Err(DocBlocksError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(DocBlocksError::ReadFailed {
            input: path.display().to_string(),
            source,
        }),
    }
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, DocBlocksError> {
    if reqwest::Url::parse(url).is_err() {
        return Err(DocBlocksError::InvalidInput {
            input: url.to_string(),
        });
    }

    info!("Downloading: {}", url);

    let failed = |reason: String| DocBlocksError::DownloadFailed {
        url: url.to_string(),
        reason,
    };
    let classify = |e: reqwest::Error| {
        if e.is_timeout() {
            DocBlocksError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(classify)?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(classify)?;
    info!("Downloaded {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}
