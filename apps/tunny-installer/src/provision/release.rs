//! Release naming: which archive to fetch and which file to pull out of it.
//!
//! Archives are published under a per-version directory below the release
//! base URL:
//!
//! ```text
//! <base>/v<version>/<package>_<version>_<os>_<arch>.tar.gz
//! ```
//!
//! e.g. `https://github.com/tunny-dev/tunny/releases/download/v1.2.0/tunny_1.2.0_linux_amd64.tar.gz`.

use semver::Version;

use super::Platform;
use crate::config::InstallConfig;
use crate::errors::ProvisionError;

/// Archive extension of every published release.
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// The resolved (platform, version) pair identifying one release artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Resolved naming tokens for the host.
    pub platform: Platform,
    /// Version to install.
    pub version: Version,
}

impl TargetSpec {
    /// Resolves the target from configuration.
    ///
    /// The platform is resolved first so an unsupported host is reported
    /// even when the version is also malformed.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnsupportedPlatform`] or
    /// [`ProvisionError::InvalidVersion`].
    pub fn resolve(config: &InstallConfig) -> Result<Self, ProvisionError> {
        let platform = Platform::resolve(&config.os, &config.arch)?;
        let version = parse_version(&config.version)?;
        Ok(Self { platform, version })
    }
}

/// Parses a version, accepting an optional leading `v`.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidVersion`] if the string is not semver.
pub fn parse_version(raw: &str) -> Result<Version, ProvisionError> {
    let trimmed = raw.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).map_err(|source| ProvisionError::InvalidVersion {
        version: raw.to_string(),
        source,
    })
}

/// Concrete download location and expected executable for a [`TargetSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    /// Full URL of the release archive.
    pub download_url: String,
    /// File name of the archive (last URL segment).
    pub archive_name: String,
    /// File name of the executable inside the archive.
    pub binary_name: String,
}

impl ReleaseDescriptor {
    /// Derives the descriptor for `target`. Pure; equal inputs give equal output.
    #[must_use]
    pub fn new(package_name: &str, release_base_url: &str, target: &TargetSpec) -> Self {
        let version = &target.version;
        let archive_name = format!(
            "{package_name}_{version}_{os}_{arch}{ARCHIVE_EXTENSION}",
            os = target.platform.os.as_str(),
            arch = target.platform.arch.as_str(),
        );
        let base = release_base_url.trim_end_matches('/');
        let download_url = format!("{base}/v{version}/{archive_name}");
        let binary_name = format!(
            "{package_name}{}",
            target.platform.executable_extension()
        );

        Self {
            download_url,
            archive_name,
            binary_name,
        }
    }
}
