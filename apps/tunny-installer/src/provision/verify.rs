//! Integrity checks on a downloaded archive before it is extracted.
//!
//! [`validate`] rejects empty files and anything not starting with the gzip
//! signature, which is what an HTML error page or a truncated transfer looks
//! like. [`verify_checksum`] additionally pins the archive to a known SHA-256
//! when the user supplied one.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::errors::ProvisionError;

/// Leading bytes of every gzip stream.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Checks that `path` is non-empty and starts with [`GZIP_MAGIC`].
///
/// Read-only. A file shorter than two bytes is reported as
/// [`ProvisionError::NotAnArchive`].
///
/// # Errors
///
/// - [`ProvisionError::EmptyFile`] when the file has no content
/// - [`ProvisionError::NotAnArchive`] when the signature is missing
/// - [`ProvisionError::Io`] when the file cannot be read
pub fn validate(path: &Path) -> Result<(), ProvisionError> {
    let size = std::fs::metadata(path)
        .map_err(|e| ProvisionError::io(format!("Failed to stat {}", path.display()), e))?
        .len();

    if size == 0 {
        return Err(ProvisionError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    let mut file = File::open(path)
        .map_err(|e| ProvisionError::io(format!("Failed to open {}", path.display()), e))?;
    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) if magic == GZIP_MAGIC => Ok(()),
        Ok(()) => Err(not_an_archive(path, size)),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(not_an_archive(path, size)),
        Err(e) => Err(ProvisionError::io(
            format!("Failed to read {}", path.display()),
            e,
        )),
    }
}

fn not_an_archive(path: &Path, size: u64) -> ProvisionError {
    ProvisionError::NotAnArchive {
        path: path.to_path_buf(),
        size,
    }
}

/// Verifies that a file matches the expected SHA-256 checksum.
///
/// The comparison ignores case and surrounding whitespace in `expected`.
///
/// # Errors
///
/// - [`ProvisionError::ChecksumMismatch`] when the digests differ
/// - [`ProvisionError::Io`] when the file cannot be read
pub fn verify_checksum(file_path: &Path, expected: &str) -> Result<(), ProvisionError> {
    let computed = compute_sha256(file_path)?;
    let expected = expected.trim().to_lowercase();

    if computed != expected {
        return Err(ProvisionError::ChecksumMismatch {
            expected,
            actual: computed,
        });
    }

    Ok(())
}

/// Computes the SHA-256 of a file as a lowercase hex string.
///
/// # Errors
///
/// Returns [`ProvisionError::Io`] if the file cannot be opened or read.
pub fn compute_sha256(file_path: &Path) -> Result<String, ProvisionError> {
    let mut file = File::open(file_path).map_err(|e| {
        ProvisionError::io(
            format!("Failed to open file for checksum: {}", file_path.display()),
            e,
        )
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(|e| {
            ProvisionError::io(
                format!("Failed to read file for checksum: {}", file_path.display()),
                e,
            )
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447";

    fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).expect("Should write test file");
        path
    }

    #[test]
    fn validate_accepts_gzip_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "ok.tar.gz", &[0x1f, 0x8b, 0x08, 0x00]);
        assert!(validate(&path).is_ok());
    }

    #[test]
    fn validate_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.tar.gz", b"");
        match validate(&path) {
            Err(ProvisionError::EmptyFile { path: p }) => assert_eq!(p, path),
            other => panic!("expected EmptyFile, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_html_error_page() {
        let dir = tempfile::tempdir().unwrap();
        let body = b"<html><body>Not Found</body></html>";
        let path = write(&dir, "page.tar.gz", body);
        match validate(&path) {
            Err(ProvisionError::NotAnArchive { size, .. }) => assert_eq!(size, body.len() as u64),
            other => panic!("expected NotAnArchive, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_single_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "short.tar.gz", &[0x1f]);
        assert!(matches!(
            validate(&path),
            Err(ProvisionError::NotAnArchive { size: 1, .. })
        ));
    }

    #[test]
    fn validate_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = [0x1f, 0x8b, 0x00, 0x01, 0x02];
        let path = write(&dir, "keep.tar.gz", &bytes);
        validate(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn compute_sha256_produces_correct_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "hello.txt", b"hello world\n");
        assert_eq!(compute_sha256(&path).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn verify_checksum_handles_uppercase_expected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "hello.txt", b"hello world\n");
        assert!(verify_checksum(&path, &HELLO_SHA256.to_uppercase()).is_ok());
    }

    #[test]
    fn verify_checksum_reports_both_digests() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "hello.txt", b"hello world\n");
        match verify_checksum(&path, "deadbeef") {
            Err(ProvisionError::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, "deadbeef");
                assert_eq!(actual, HELLO_SHA256);
            }
            other => panic!("expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn compute_sha256_fails_for_nonexistent_file() {
        let result = compute_sha256(Path::new("/nonexistent/file/path"));
        assert!(matches!(result, Err(ProvisionError::Io { .. })));
    }
}
