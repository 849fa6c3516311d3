//! HTTP download of release archives.
//!
//! The archive is streamed chunk by chunk into a temporary file under the
//! install root; the body is never held in memory as a whole.
//!
//! Redirects are handled here rather than by the HTTP client: automatic
//! redirects are disabled and at most [`MAX_REDIRECTS`] hops are followed.
//! Release hosts such as GitHub answer with a single redirect to their CDN,
//! so a second redirect is treated as a protocol violation.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::scratch;
use crate::errors::ProvisionError;

/// Number of redirect hops followed before giving up.
pub const MAX_REDIRECTS: u32 = 1;

/// Connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Overall request timeout, body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// User-Agent header for HTTP requests.
const USER_AGENT: &str = concat!("tunny-installer/", env!("CARGO_PKG_VERSION"));

/// A downloaded archive, deleted from disk when dropped.
#[derive(Debug)]
pub struct DownloadArtifact {
    path: TempPath,
    byte_size: u64,
    url: String,
}

impl DownloadArtifact {
    /// Location of the archive on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// URL the bytes were finally served from (after redirects).
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deletes the archive now instead of at drop.
    pub fn release(self) {
        scratch::release_file(self.path);
    }

    /// Wraps an archive written to `path` by hand.
    #[cfg(test)]
    pub(crate) fn adopt(path: TempPath, url: &str) -> std::io::Result<Self> {
        let byte_size = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            byte_size,
            url: url.to_string(),
        })
    }
}

/// Downloads `url` into a new temporary file in `dest_dir`.
///
/// # Errors
///
/// - [`ProvisionError::DownloadFailed`] for transport failures
/// - [`ProvisionError::ReleaseNotFound`] when the server answers 404
/// - [`ProvisionError::HttpStatus`] for any other non-success status
/// - [`ProvisionError::RedirectLoop`] when more than [`MAX_REDIRECTS`] hops are requested
/// - [`ProvisionError::Io`] when the temporary file cannot be written
///
/// No temporary file is left behind on error.
pub async fn fetch(url: &str, dest_dir: &Path) -> Result<DownloadArtifact, ProvisionError> {
    let client = build_client().map_err(|source| ProvisionError::DownloadFailed {
        url: url.to_string(),
        source,
    })?;

    let (response, final_url) = send_following_redirects(&client, url).await?;
    debug!(
        url = %final_url,
        content_length = ?response.content_length(),
        "download started"
    );

    let path = scratch::download_path(dest_dir).map_err(|e| {
        ProvisionError::io(
            format!("Failed to create temporary file in {}", dest_dir.display()),
            e,
        )
    })?;

    match stream_to_file(response, &path, &final_url).await {
        Ok(byte_size) => {
            info!(url = %final_url, bytes = byte_size, "download finished");
            Ok(DownloadArtifact {
                path,
                byte_size,
                url: final_url,
            })
        }
        Err(e) => {
            scratch::release_file(path);
            Err(e)
        }
    }
}

fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
}

/// Issues the GET, following at most [`MAX_REDIRECTS`] redirects.
///
/// Returns the successful response together with the URL that produced it.
async fn send_following_redirects(
    client: &reqwest::Client,
    url: &str,
) -> Result<(reqwest::Response, String), ProvisionError> {
    let mut current = url.to_string();
    let mut hops = 0;

    loop {
        let response = client
            .get(&current)
            .send()
            .await
            .map_err(|source| ProvisionError::DownloadFailed {
                url: current.clone(),
                source,
            })?;

        let status = response.status();

        if status.is_redirection() {
            if hops >= MAX_REDIRECTS {
                return Err(ProvisionError::RedirectLoop { url: current, hops });
            }
            let Some(next) = redirect_target(&response) else {
                return Err(ProvisionError::HttpStatus {
                    status: status.as_u16(),
                    url: current,
                });
            };
            debug!(from = %current, to = %next, status = status.as_u16(), "following redirect");
            current = next;
            hops += 1;
            continue;
        }

        if !status.is_success() {
            return Err(ProvisionError::from_status(status.as_u16(), current));
        }

        return Ok((response, current));
    }
}

/// Resolves the `Location` header against the response URL.
fn redirect_target(response: &reqwest::Response) -> Option<String> {
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)?
        .to_str()
        .ok()?;
    response.url().join(location).ok().map(|u| u.to_string())
}

async fn stream_to_file(
    response: reqwest::Response,
    dest: &Path,
    url: &str,
) -> Result<u64, ProvisionError> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| ProvisionError::io(format!("Failed to create file: {}", dest.display()), e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| ProvisionError::DownloadFailed {
            url: url.to_string(),
            source,
        })?;
        file.write_all(&chunk)
            .await
            .map_err(|e| ProvisionError::io(format!("Failed to write to {}", dest.display()), e))?;
        downloaded += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| ProvisionError::io(format!("Failed to flush {}", dest.display()), e))?;

    Ok(downloaded)
}

/// Formats bytes into a human-readable string (KB, MB, GB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}
