//! Install command for `tunny-install`.
//!
//! Downloads the release archive for the host and installs the `tunny`
//! executable into the install root.
//!
//! ## Usage
//!
//! ```bash
//! tunny-install                       # Install this installer's version
//! tunny-install install 1.2.0         # Install a specific version
//! tunny-install install --sha256 ...  # Pin the archive digest
//! ```

use anyhow::Result;
use clap::Args;

use tunny_installer::config::InstallConfig;
use tunny_installer::provision::provision;

/// Arguments for the install command.
#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Version to install (e.g. "1.2.0" or "v1.2.0").
    ///
    /// Defaults to `TUNNY_VERSION`, then to this installer's own version.
    pub version: Option<String>,

    /// Operating system identifier to install for (e.g. "linux", "macos").
    ///
    /// Defaults to the host.
    #[clap(long)]
    pub os: Option<String>,

    /// CPU architecture identifier to install for (e.g. "x86_64", "aarch64").
    ///
    /// Defaults to the host.
    #[clap(long)]
    pub arch: Option<String>,

    /// Release base URL. Overrides `TUNNY_DIST_SERVER`.
    #[clap(long = "dist-server", value_name = "URL")]
    pub dist_server: Option<String>,

    /// Expected SHA-256 of the archive. Overrides `TUNNY_SHA256`.
    #[clap(long, value_name = "HEX")]
    pub sha256: Option<String>,
}

impl InstallArgs {
    /// Applies the flags on top of `config`.
    #[must_use]
    pub fn apply(&self, mut config: InstallConfig) -> InstallConfig {
        if let Some(version) = &self.version {
            config = config.version(version.clone());
        }
        if self.os.is_some() || self.arch.is_some() {
            let os = self.os.clone().unwrap_or_else(|| config.os.clone());
            let arch = self.arch.clone().unwrap_or_else(|| config.arch.clone());
            config = config.platform(os, arch);
        }
        if let Some(url) = &self.dist_server {
            config = config.release_base_url(url.clone());
        }
        if let Some(digest) = &self.sha256 {
            config = config.expected_sha256(digest.clone());
        }
        config
    }
}

/// Executes the install command.
///
/// # Errors
///
/// Returns the pipeline's [`ProvisionFailure`](tunny_installer::provision::ProvisionFailure)
/// wrapped in `anyhow`, so the caller can report the failing stage.
pub async fn execute(args: &InstallArgs, config: InstallConfig) -> Result<()> {
    let config = args.apply(config);
    let installed = provision(&config).await?;

    println!(
        "Installed {} {} to {}",
        config.package_name,
        config.version,
        installed.path.display()
    );
    println!();
    println!("Run: tunny --help");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_args_keep_config() {
        let base = InstallConfig::with_root("/r").platform("linux", "x86_64");
        assert_eq!(InstallArgs::default().apply(base.clone()), base);
    }

    #[test]
    fn flags_override_config() {
        let base = InstallConfig::with_root("/r").platform("linux", "x86_64");
        let args = InstallArgs {
            version: Some("v2.0.0".to_string()),
            os: None,
            arch: Some("aarch64".to_string()),
            dist_server: Some("http://mirror/".to_string()),
            sha256: Some("ab".to_string()),
        };
        let config = args.apply(base);

        assert_eq!(config.version, "v2.0.0");
        assert_eq!(config.os, "linux");
        assert_eq!(config.arch, "aarch64");
        assert_eq!(config.release_base_url, "http://mirror");
        assert_eq!(config.expected_sha256.as_deref(), Some("ab"));
    }
}
