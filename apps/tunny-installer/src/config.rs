//! Installer configuration.
//!
//! [`InstallConfig`] captures everything the provisioning pipeline needs from
//! the process environment. It is built once at program entry by
//! [`InstallConfig::from_env`] and passed down by reference; no other module
//! reads environment variables.
//!
//! ## Environment Variables
//!
//! | Variable            | Meaning                                   | Default |
//! |---------------------|-------------------------------------------|---------|
//! | `TUNNY_HOME`        | Install root holding the binary           | `~/.tunny/bin` |
//! | `TUNNY_DIST_SERVER` | Release base URL                          | GitHub releases |
//! | `TUNNY_VERSION`     | Version to install                        | this package's version |
//! | `TUNNY_SHA256`      | Expected archive SHA-256 (optional)       | unset |
//!
//! Command line flags override the corresponding variable.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable overriding the install root.
pub const TUNNY_HOME_ENV: &str = "TUNNY_HOME";

/// Environment variable overriding the release base URL.
pub const DIST_SERVER_ENV: &str = "TUNNY_DIST_SERVER";

/// Environment variable overriding the version to install.
pub const VERSION_ENV: &str = "TUNNY_VERSION";

/// Environment variable pinning the expected archive digest.
pub const SHA256_ENV: &str = "TUNNY_SHA256";

/// Name of the provisioned package; also the installed executable's stem.
pub const PACKAGE_NAME: &str = "tunny";

/// Default release base URL. Archives live under `v<version>/` below it.
pub const DEFAULT_DIST_SERVER: &str = "https://github.com/tunny-dev/tunny/releases/download";

/// Process-wide installer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallConfig {
    /// Package name used in archive names and as the binary stem.
    pub package_name: String,
    /// Version to install, as written by the user (a leading `v` is allowed).
    pub version: String,
    /// Host operating-system identifier.
    pub os: String,
    /// Host CPU-architecture identifier.
    pub arch: String,
    /// Release base URL, without a trailing slash.
    pub release_base_url: String,
    /// Directory that receives the installed binary and temporary artifacts.
    pub install_root: PathBuf,
    /// Optional SHA-256 the archive must match.
    pub expected_sha256: Option<String>,
}

impl InstallConfig {
    /// Builds the configuration from the process environment.
    ///
    /// The install root is resolved in the following order:
    ///
    /// 1. `TUNNY_HOME` environment variable
    /// 2. On Windows: `%APPDATA%\tunny\bin`
    /// 3. On Unix: `~/.tunny/bin`
    ///
    /// # Errors
    ///
    /// Returns an error if `TUNNY_HOME` is unset and the home directory
    /// cannot be determined.
    pub fn from_env() -> Result<Self> {
        let install_root = match non_empty_var(TUNNY_HOME_ENV) {
            Some(home) => PathBuf::from(home),
            None => default_install_root()?,
        };

        Ok(Self {
            package_name: PACKAGE_NAME.to_string(),
            version: non_empty_var(VERSION_ENV)
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            release_base_url: non_empty_var(DIST_SERVER_ENV)
                .unwrap_or_else(|| DEFAULT_DIST_SERVER.to_string()),
            install_root,
            expected_sha256: non_empty_var(SHA256_ENV),
        }
        .normalized())
    }

    /// Creates a configuration rooted at `install_root` for the host platform.
    ///
    /// Nothing is read from the environment. Useful for tests and embedding.
    #[must_use = "returns new config without side effects"]
    pub fn with_root(install_root: impl Into<PathBuf>) -> Self {
        Self {
            package_name: PACKAGE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            release_base_url: DEFAULT_DIST_SERVER.to_string(),
            install_root: install_root.into(),
            expected_sha256: None,
        }
    }

    /// Overrides the version to install.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Overrides the host platform identifiers.
    #[must_use]
    pub fn platform(mut self, os: impl Into<String>, arch: impl Into<String>) -> Self {
        self.os = os.into();
        self.arch = arch.into();
        self
    }

    /// Overrides the release base URL.
    #[must_use]
    pub fn release_base_url(mut self, url: impl Into<String>) -> Self {
        self.release_base_url = url.into();
        self.normalized()
    }

    /// Overrides the install root.
    #[must_use]
    pub fn install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.install_root = root.into();
        self
    }

    /// Pins the SHA-256 the downloaded archive must match.
    #[must_use]
    pub fn expected_sha256(mut self, digest: impl Into<String>) -> Self {
        self.expected_sha256 = Some(digest.into());
        self
    }

    fn normalized(mut self) -> Self {
        while self.release_base_url.ends_with('/') {
            self.release_base_url.pop();
        }
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_install_root() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        Ok(dirs::data_dir()
            .context("Cannot determine AppData directory. Set TUNNY_HOME environment variable.")?
            .join("tunny")
            .join("bin"))
    }
    #[cfg(not(windows))]
    {
        Ok(dirs::home_dir()
            .context("Cannot determine home directory. Set TUNNY_HOME environment variable.")?
            .join(".tunny")
            .join("bin"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs `f` with the given variables set, restoring previous values afterwards.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let saved: Vec<_> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: callers are marked #[serial_test::serial] so no other test
        // touches the environment concurrently.
        unsafe {
            for (k, v) in vars {
                match v {
                    Some(v) => std::env::set_var(k, v),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        unsafe {
            for (k, v) in saved {
                match v {
                    Some(v) => std::env::set_var(k, v),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    #[serial_test::serial]
    fn from_env_reads_overrides() {
        with_env(
            &[
                (TUNNY_HOME_ENV, Some("/opt/tunny")),
                (DIST_SERVER_ENV, Some("http://mirror.local/releases/")),
                (VERSION_ENV, Some("1.2.0")),
                (SHA256_ENV, Some("ABCDEF")),
            ],
            || {
                let config = InstallConfig::from_env().expect("config");
                assert_eq!(config.install_root, PathBuf::from("/opt/tunny"));
                assert_eq!(config.release_base_url, "http://mirror.local/releases");
                assert_eq!(config.version, "1.2.0");
                assert_eq!(config.expected_sha256.as_deref(), Some("ABCDEF"));
                assert_eq!(config.package_name, PACKAGE_NAME);
            },
        );
    }

    #[test]
    #[serial_test::serial]
    fn from_env_falls_back_to_defaults() {
        with_env(
            &[
                (TUNNY_HOME_ENV, Some("/opt/tunny")),
                (DIST_SERVER_ENV, None),
                (VERSION_ENV, Some("   ")),
                (SHA256_ENV, None),
            ],
            || {
                let config = InstallConfig::from_env().expect("config");
                assert_eq!(config.release_base_url, DEFAULT_DIST_SERVER);
                assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
                assert_eq!(config.expected_sha256, None);
                assert_eq!(config.os, std::env::consts::OS);
                assert_eq!(config.arch, std::env::consts::ARCH);
            },
        );
    }

    #[test]
    fn builder_overrides_fields() {
        let config = InstallConfig::with_root("/tmp/root")
            .version("2.0.0")
            .platform("linux", "x86_64")
            .release_base_url("http://localhost:1234//")
            .expected_sha256("00ff");

        assert_eq!(config.version, "2.0.0");
        assert_eq!(config.os, "linux");
        assert_eq!(config.arch, "x86_64");
        assert_eq!(config.release_base_url, "http://localhost:1234");
        assert_eq!(config.expected_sha256.as_deref(), Some("00ff"));
        assert_eq!(config.install_root, PathBuf::from("/tmp/root"));
    }
}
