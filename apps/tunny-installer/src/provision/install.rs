//! Extraction of the release archive and relocation of its executable.
//!
//! The archive is unpacked into a run-scoped scratch directory next to the
//! final binary, never directly into the final location. Only after the
//! executable has been found is it renamed onto the final path, so a failed
//! install leaves any previous binary untouched.
//!
//! Release archives either carry the executable at their root or inside a
//! single top-level folder (`tunny_1.2.0_linux_amd64/tunny`). Discovery
//! searches exactly those two levels.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

use super::Platform;
use super::download::DownloadArtifact;
use super::scratch;
use crate::errors::ProvisionError;

/// The installed executable.
#[derive(Debug, Clone)]
pub struct InstalledBinary {
    /// Final location of the executable.
    pub path: PathBuf,
    /// Permissions of the file after installation.
    pub permissions: fs::Permissions,
}

/// Installs the executable named `binary_name` from `artifact` at `final_path`.
///
/// The archive and the scratch directory are removed before this returns,
/// whatever the outcome.
///
/// # Errors
///
/// - [`ProvisionError::ExtractionFailed`] for decode errors or unsafe entry paths
/// - [`ProvisionError::BinaryNotFound`] when neither the root nor a first-level
///   directory holds a regular file named `binary_name`
/// - [`ProvisionError::Io`] when the scratch directory, rename or permission
///   change fails
pub fn install(
    artifact: DownloadArtifact,
    binary_name: &str,
    final_path: &Path,
    platform: Platform,
) -> Result<InstalledBinary, ProvisionError> {
    let root = match final_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let scratch = scratch::scratch_dir(root).map_err(|e| {
        ProvisionError::io(
            format!("Failed to create scratch directory in {}", root.display()),
            e,
        )
    })?;

    let result = extract_and_relocate(artifact.path(), scratch.path(), binary_name, final_path)
        .and_then(|()| finish_permissions(final_path, platform));

    scratch::release_dir(scratch);
    artifact.release();

    result
}

fn extract_and_relocate(
    archive: &Path,
    scratch: &Path,
    binary_name: &str,
    final_path: &Path,
) -> Result<(), ProvisionError> {
    extract_tar_gz(archive, scratch)
        .map_err(|e| ProvisionError::extraction_failed(archive, e))?;

    let found = find_binary(scratch, binary_name)
        .map_err(|e| {
            ProvisionError::io(format!("Failed to search {}", scratch.display()), e)
        })?
        .ok_or_else(|| ProvisionError::BinaryNotFound {
            binary_name: binary_name.to_string(),
        })?;
    debug!(found = %found.display(), dest = %final_path.display(), "relocating binary");

    fs::rename(&found, final_path).map_err(|e| {
        ProvisionError::io(
            format!(
                "Failed to move {} to {}",
                found.display(),
                final_path.display()
            ),
            e,
        )
    })
}

fn finish_permissions(path: &Path, platform: Platform) -> Result<InstalledBinary, ProvisionError> {
    if platform.needs_exec_bit() {
        set_executable_permissions(path)?;
    }

    let permissions = fs::metadata(path)
        .map_err(|e| ProvisionError::io(format!("Failed to get metadata: {}", path.display()), e))?
        .permissions();

    Ok(InstalledBinary {
        path: path.to_path_buf(),
        permissions,
    })
}

/// Sets mode `0o755` on `path`.
#[cfg(unix)]
fn set_executable_permissions(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|e| {
        ProvisionError::io(format!("Failed to set permissions: {}", path.display()), e)
    })
}

/// No-op on non-Unix platforms.
#[cfg(not(unix))]
fn set_executable_permissions(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}

/// Unpacks a `.tar.gz` archive into `dest_dir`.
///
/// Entries with absolute paths or `..` components are refused. Only regular
/// files and directories are written; links and special entries are skipped,
/// so nothing outside `dest_dir` can be reached through the archive.
fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> io::Result<()> {
    let file = fs::File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();

        if entry_path.is_absolute()
            || entry_path
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(unsafe_entry(&entry_path));
        }

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            fs::create_dir_all(dest_dir.join(&entry_path))?;
        } else if entry_type.is_file() {
            if !entry.unpack_in(dest_dir)? {
                return Err(unsafe_entry(&entry_path));
            }
        } else {
            debug!(path = %entry_path.display(), ?entry_type, "skipping non-regular archive entry");
        }
    }

    Ok(())
}

fn unsafe_entry(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!(
            "refusing to extract path with parent directory or absolute reference: {}",
            path.display()
        ),
    )
}

/// Looks for a regular file named `binary_name` at the root of `dir`, then in
/// each immediate subdirectory in name order.
fn find_binary(dir: &Path, binary_name: &str) -> io::Result<Option<PathBuf>> {
    let entries = sorted_entries(dir)?;

    if let Some(path) = regular_file_named(&entries, binary_name) {
        return Ok(Some(path));
    }

    for (path, file_type) in &entries {
        if !file_type.is_dir() {
            continue;
        }
        if let Some(found) = regular_file_named(&sorted_entries(path)?, binary_name) {
            return Ok(Some(found));
        }
    }

    Ok(None)
}

fn regular_file_named(entries: &[(PathBuf, fs::FileType)], name: &str) -> Option<PathBuf> {
    entries
        .iter()
        .find(|(path, file_type)| {
            file_type.is_file() && path.file_name().is_some_and(|n| n == name)
        })
        .map(|(path, _)| path.clone())
}

/// Directory entries sorted by name. File types do not follow symlinks.
fn sorted_entries(dir: &Path) -> io::Result<Vec<(PathBuf, fs::FileType)>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| {
            let entry = entry?;
            Ok((entry.path(), entry.file_type()?))
        })
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}
