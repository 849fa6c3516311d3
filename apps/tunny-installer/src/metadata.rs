//! Read-only view of where the `tunny` binary lives.
//!
//! Used by the launcher to find the executable it forwards to and by
//! `tunny-install info`. Nothing here writes to disk.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::InstallConfig;
use crate::provision::Platform;

/// Package name, version and installed binary location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    /// Package name.
    pub name: String,
    /// Configured version.
    pub version: String,
    /// Path the installer writes the executable to.
    pub binary_path: PathBuf,
}

impl PackageMetadata {
    /// Derives metadata from `config`.
    ///
    /// The path is the same one the installer writes. When the configured
    /// platform is unsupported the host's executable suffix is used, so the
    /// launcher can still report a path.
    #[must_use]
    pub fn resolve(config: &InstallConfig) -> Self {
        let binary_path = config
            .install_root
            .join(binary_file_name(config));

        Self {
            name: config.package_name.clone(),
            version: config.version.clone(),
            binary_path,
        }
    }

    /// Returns `true` if the binary exists as a file.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.binary_path.is_file()
    }
}

/// File name of the installed executable for `config`'s platform.
#[must_use]
pub fn binary_file_name(config: &InstallConfig) -> String {
    let suffix = Platform::resolve(&config.os, &config.arch)
        .map_or(std::env::consts::EXE_SUFFIX, Platform::executable_extension);
    format!("{}{suffix}", config.package_name)
}
