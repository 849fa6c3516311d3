//! Run-scoped temporary artifacts under the install root.
//!
//! The downloaded archive and the extraction workspace both live next to the
//! final binary so the last rename never crosses a filesystem. Their names
//! carry a fixed prefix plus the process id, which lets a later run recognise
//! and sweep leftovers from a run that was killed mid-way.
//!
//! Both artifacts are guards: dropping them deletes the file or directory.
//!
//! A stale sweep only touches entries whose owning process has exited, so a
//! concurrent run against the same root keeps its files. Where liveness
//! cannot be checked (non-Unix hosts) every foreign entry counts as stale.

use std::io;
use std::path::Path;

use tempfile::{TempDir, TempPath};
use tracing::{debug, warn};

/// Name prefix of downloaded archives.
pub const DOWNLOAD_PREFIX: &str = ".tunny-download-";

/// Name prefix of extraction workspaces.
pub const SCRATCH_PREFIX: &str = ".tunny-extract-";

/// Creates an empty, uniquely named archive file in `root`.
///
/// # Errors
///
/// Returns an error if the file cannot be created.
pub fn download_path(root: &Path) -> io::Result<TempPath> {
    let prefix = format!("{DOWNLOAD_PREFIX}{}-", std::process::id());
    let file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tar.gz")
        .tempfile_in(root)?;
    Ok(file.into_temp_path())
}

/// Creates a fresh, uniquely named extraction directory in `root`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn scratch_dir(root: &Path) -> io::Result<TempDir> {
    let prefix = format!("{SCRATCH_PREFIX}{}-", std::process::id());
    tempfile::Builder::new().prefix(&prefix).tempdir_in(root)
}

/// Deletes a temporary file now, logging instead of failing.
pub fn release_file(path: TempPath) {
    let shown = path.display().to_string();
    if let Err(e) = path.close() {
        warn!(path = %shown, error = %e, "failed to remove temporary archive");
    }
}

/// Deletes a temporary directory now, logging instead of failing.
pub fn release_dir(dir: TempDir) {
    let shown = dir.path().display().to_string();
    if let Err(e) = dir.close() {
        warn!(path = %shown, error = %e, "failed to remove scratch directory");
    }
}

/// Which temporary entries a sweep removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sweep {
    /// Entries left by processes that are no longer running.
    Stale,
    /// Entries created by the given process id only.
    Process(u32),
}

/// Removes temporary artifacts from `root` and returns how many were removed.
///
/// Missing `root` is not an error. Entries that cannot be removed are logged
/// and skipped.
pub fn sweep(root: &Path, scope: Sweep) -> usize {
    let Ok(entries) = std::fs::read_dir(root) else {
        return 0;
    };

    let mut removed = 0;
    for entry in entries.filter_map(Result::ok) {
        let name = entry.file_name();
        let Some(owner) = owner_pid(&name.to_string_lossy()) else {
            continue;
        };
        let selected = match scope {
            Sweep::Stale => owner.is_none_or(|pid| !is_running(pid)),
            Sweep::Process(pid) => owner == Some(pid),
        };
        if !selected {
            continue;
        }

        let path = entry.path();
        let result = match entry.file_type() {
            Ok(ft) if ft.is_dir() => std::fs::remove_dir_all(&path),
            _ => std::fs::remove_file(&path),
        };
        match result {
            Ok(()) => {
                debug!(path = %path.display(), "removed temporary artifact");
                removed += 1;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temporary artifact"),
        }
    }
    removed
}

/// `None` for names without a temporary prefix, `Some(None)` when the prefix
/// is present but the pid is unreadable.
#[allow(clippy::option_option)]
fn owner_pid(name: &str) -> Option<Option<u32>> {
    let rest = [DOWNLOAD_PREFIX, SCRATCH_PREFIX]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))?;
    Some(rest.split('-').next().and_then(|pid| pid.parse().ok()))
}

/// Whether `pid` names a live process. This process always counts as live.
fn is_running(pid: u32) -> bool {
    if pid == std::process::id() {
        return true;
    }
    process_exists(pid)
}

#[cfg(unix)]
fn process_exists(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 performs only the existence and permission check.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn process_exists(_pid: u32) -> bool {
    false
}
