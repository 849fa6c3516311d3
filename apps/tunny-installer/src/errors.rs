//! Error types for the tunny installer.
//!
//! Every failure the provisioning pipeline can report is a variant of
//! [`ProvisionError`]. Each variant carries the context an operator needs to
//! retry by hand or to diagnose a release/version mismatch: the URL that was
//! attempted, the file name that was expected, or the byte size observed.
//!
//! All errors are terminal for the current run. The orchestrator pairs an
//! error with the [`Stage`](crate::provision::Stage) it occurred in, see
//! [`ProvisionFailure`](crate::provision::ProvisionFailure).

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for provisioning operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The host operating system or architecture has no release artifact.
    #[error(
        "unsupported platform: {os} on {arch} \
         (supported: linux, darwin, windows on amd64 or arm64)"
    )]
    UnsupportedPlatform {
        /// Operating system identifier that failed to resolve.
        os: String,
        /// CPU architecture identifier that failed to resolve.
        arch: String,
    },

    /// The requested package version is not a valid semantic version.
    #[error("invalid version '{version}': {source}")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
        /// The underlying parse error.
        #[source]
        source: semver::Error,
    },

    /// Network-layer failure (DNS, TLS, connection reset, truncated body).
    #[error("download failed for {url}: {source}")]
    DownloadFailed {
        /// The URL being downloaded.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered 404 for the release archive.
    #[error("release not found for this version: {url} (HTTP 404)")]
    ReleaseNotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The server answered with a non-success status other than 404.
    #[error("HTTP error {status}: {url}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The URL that produced it.
        url: String,
    },

    /// The server redirected more times than the installer follows.
    #[error("too many redirects ({hops} followed) while downloading {url}")]
    RedirectLoop {
        /// The URL that issued the extra redirect.
        url: String,
        /// How many hops had already been followed.
        hops: u32,
    },

    /// The downloaded archive has no content.
    #[error("downloaded archive is empty: {}", path.display())]
    EmptyFile {
        /// Path of the empty download.
        path: PathBuf,
    },

    /// The downloaded file does not start with the gzip signature.
    #[error(
        "downloaded file is not a gzip archive: {} ({size} bytes)",
        path.display()
    )]
    NotAnArchive {
        /// Path of the rejected download.
        path: PathBuf,
        /// Observed size in bytes.
        size: u64,
    },

    /// The archive digest does not match the pinned SHA-256.
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The expected checksum.
        expected: String,
        /// The actual checksum.
        actual: String,
    },

    /// The archive could not be unpacked.
    #[error("failed to extract {}: {source}", archive.display())]
    ExtractionFailed {
        /// The archive being extracted.
        archive: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No file with the expected name exists at the archive root or one level below.
    #[error("binary '{binary_name}' not found in archive (searched the root and one directory level)")]
    BinaryNotFound {
        /// The expected executable file name.
        binary_name: String,
    },

    /// Local filesystem operation failed outside of extraction.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `ExtractionFailed` error.
    #[must_use]
    pub fn extraction_failed(archive: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ExtractionFailed {
            archive: archive.into(),
            source,
        }
    }

    /// Creates a new `UnsupportedPlatform` error.
    #[must_use]
    pub fn unsupported_platform(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Maps a terminal HTTP status to the matching error variant.
    ///
    /// 404 becomes [`ProvisionError::ReleaseNotFound`] so the caller is
    /// pointed at a version mismatch rather than a server fault.
    #[must_use]
    pub fn from_status(status: u16, url: impl Into<String>) -> Self {
        let url = url.into();
        if status == 404 {
            Self::ReleaseNotFound { url }
        } else {
            Self::HttpStatus { status, url }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_platform_names_the_pair() {
        let err = ProvisionError::unsupported_platform("freebsd", "riscv64");
        let msg = err.to_string();
        assert!(msg.contains("freebsd"));
        assert!(msg.contains("riscv64"));
    }

    #[test]
    fn status_404_is_release_not_found() {
        let err = ProvisionError::from_status(404, "https://example.com/a.tar.gz");
        assert!(matches!(err, ProvisionError::ReleaseNotFound { .. }));
        assert!(err.to_string().contains("release not found"));
    }

    #[test]
    fn other_status_keeps_code() {
        let err = ProvisionError::from_status(503, "https://example.com/a.tar.gz");
        assert!(matches!(err, ProvisionError::HttpStatus { status: 503, .. }));
        assert_eq!(err.to_string(), "HTTP error 503: https://example.com/a.tar.gz");
    }

    #[test]
    fn not_an_archive_reports_size() {
        let err = ProvisionError::NotAnArchive {
            path: PathBuf::from("/tmp/x.tar.gz"),
            size: 512,
        };
        assert!(err.to_string().contains("512 bytes"));
    }

    #[test]
    fn binary_not_found_names_file() {
        let err = ProvisionError::BinaryNotFound {
            binary_name: "tunny".to_string(),
        };
        assert!(err.to_string().contains("'tunny'"));
    }

    #[test]
    fn checksum_mismatch_displays_both_values() {
        let err = ProvisionError::ChecksumMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: expected abc123, got def456"
        );
    }
}
