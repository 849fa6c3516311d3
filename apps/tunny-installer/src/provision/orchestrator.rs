//! The provisioning pipeline, stage by stage.
//!
//! ```text
//! Resolving -> Downloading -> Validating -> Extracting -> Installed
//! ```
//!
//! Stages run strictly in order and the first failure ends the run. There
//! are no retries. Resolution touches neither the network nor the
//! filesystem, so an unsupported host fails before anything is created.

use std::fmt;

use tracing::{debug, info};

use super::download::{self, format_bytes};
use super::install::{self, InstalledBinary};
use super::release::{ReleaseDescriptor, TargetSpec};
use super::scratch::{self, Sweep};
use super::verify;
use crate::config::InstallConfig;
use crate::errors::ProvisionError;

/// A step of the provisioning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Mapping host identifiers and version onto a release.
    Resolving,
    /// Fetching the archive.
    Downloading,
    /// Checking the archive's signature and optional digest.
    Validating,
    /// Unpacking and relocating the executable.
    Extracting,
    /// The executable is in place.
    Installed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Validating => "validating",
            Self::Extracting => "extracting",
            Self::Installed => "installed",
        };
        f.write_str(name)
    }
}

/// A provisioning error tagged with the stage it happened in.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct ProvisionFailure {
    /// Stage that failed.
    pub stage: Stage,
    /// What went wrong.
    #[source]
    pub source: ProvisionError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> Result<T, ProvisionFailure>;
}

impl<T> AtStage<T> for Result<T, ProvisionError> {
    fn at(self, stage: Stage) -> Result<T, ProvisionFailure> {
        self.map_err(|source| ProvisionFailure { stage, source })
    }
}

/// Runs the full pipeline for `config`.
///
/// Prints one progress line per stage to stdout.
///
/// # Errors
///
/// Returns the first [`ProvisionFailure`]; nothing after the failing stage runs.
pub async fn provision(config: &InstallConfig) -> Result<InstalledBinary, ProvisionFailure> {
    println!(
        "Resolving {} {} for {}/{}...",
        config.package_name, config.version, config.os, config.arch
    );
    let target = TargetSpec::resolve(config).at(Stage::Resolving)?;
    let release = ReleaseDescriptor::new(&config.package_name, &config.release_base_url, &target);
    info!(
        platform = %target.platform,
        version = %target.version,
        url = %release.download_url,
        "resolved release"
    );

    let root = &config.install_root;
    std::fs::create_dir_all(root)
        .map_err(|e| {
            ProvisionError::io(
                format!("Failed to create install directory: {}", root.display()),
                e,
            )
        })
        .at(Stage::Downloading)?;

    let stale = scratch::sweep(root, Sweep::Stale);
    if stale > 0 {
        debug!(count = stale, root = %root.display(), "removed stale temporary artifacts");
    }

    let result = run_stages(config, &target, &release).await;

    scratch::sweep(root, Sweep::Process(std::process::id()));
    result
}

async fn run_stages(
    config: &InstallConfig,
    target: &TargetSpec,
    release: &ReleaseDescriptor,
) -> Result<InstalledBinary, ProvisionFailure> {
    println!("Downloading {}...", release.download_url);
    let artifact = download::fetch(&release.download_url, &config.install_root)
        .await
        .at(Stage::Downloading)?;
    println!("Downloaded {}", format_bytes(artifact.byte_size()));

    println!("Validating archive...");
    verify::validate(artifact.path()).at(Stage::Validating)?;
    if let Some(expected) = &config.expected_sha256 {
        verify::verify_checksum(artifact.path(), expected).at(Stage::Validating)?;
        debug!("checksum verified");
    }

    println!("Extracting {}...", release.binary_name);
    let final_path = config.install_root.join(&release.binary_name);
    let installed = install::install(artifact, &release.binary_name, &final_path, target.platform)
        .at(Stage::Extracting)?;

    info!(stage = %Stage::Installed, path = %installed.path.display(), "provisioning complete");
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use mockito::Server;
    use sha2::{Digest, Sha256};
    use tar::{Builder, Header};

    fn archive(name: &str, contents: &[u8]) -> Vec<u8> {
        let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        let mut header = Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, contents).unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn config(root: &std::path::Path, base: &str) -> InstallConfig {
        InstallConfig::with_root(root)
            .platform("linux", "x86_64")
            .version("1.2.0")
            .release_base_url(base)
    }

    const ARCHIVE_PATH: &str = "/v1.2.0/tunny_1.2.0_linux_amd64.tar.gz";

    #[test]
    fn stage_names_are_lowercase() {
        assert_eq!(Stage::Resolving.to_string(), "resolving");
        assert_eq!(Stage::Extracting.to_string(), "extracting");
        let failure = ProvisionFailure {
            stage: Stage::Validating,
            source: ProvisionError::EmptyFile {
                path: "/tmp/a".into(),
            },
        };
        assert!(failure.to_string().starts_with("validating failed: "));
    }

    #[tokio::test]
    async fn provisions_binary_end_to_end() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body(archive("tunny", b"tunny binary"))
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        let installed = provision(&config(root.path(), &server.url()))
            .await
            .expect("provision");

        assert_eq!(installed.path, root.path().join("tunny"));
        assert_eq!(std::fs::read(&installed.path).unwrap(), b"tunny binary");
    }

    #[tokio::test]
    async fn unsupported_platform_fails_before_network() {
        let mut server = Server::new_async().await;
        let never = server.mock("GET", mockito::Matcher::Any).expect(0).create_async().await;

        let root = tempfile::tempdir().unwrap();
        let install_root = root.path().join("bin");
        let cfg = config(&install_root, &server.url()).platform("linux", "riscv64");
        let failure = provision(&cfg).await.unwrap_err();

        assert_eq!(failure.stage, Stage::Resolving);
        assert!(matches!(failure.source, ProvisionError::UnsupportedPlatform { .. }));
        assert!(!install_root.exists());
        never.assert_async().await;
    }

    #[tokio::test]
    async fn html_body_fails_validation() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        let failure = provision(&config(root.path(), &server.url()))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Validating);
        assert!(matches!(failure.source, ProvisionError::NotAnArchive { size: 17, .. }));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn empty_body_fails_validation() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        let failure = provision(&config(root.path(), &server.url()))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Validating);
        assert!(matches!(failure.source, ProvisionError::EmptyFile { .. }));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn checksum_mismatch_keeps_previous_binary() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body(archive("tunny", b"new"))
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("tunny"), b"old").unwrap();
        let cfg = config(root.path(), &server.url()).expected_sha256("00".repeat(32));
        let failure = provision(&cfg).await.unwrap_err();

        assert_eq!(failure.stage, Stage::Validating);
        assert!(matches!(failure.source, ProvisionError::ChecksumMismatch { .. }));
        assert_eq!(std::fs::read(root.path().join("tunny")).unwrap(), b"old");
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn matching_checksum_installs() {
        let body = archive("tunny", b"pinned");
        let digest = hex::encode(Sha256::digest(&body));
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        let cfg = config(root.path(), &server.url()).expected_sha256(digest.to_uppercase());
        let installed = provision(&cfg).await.expect("provision");
        assert_eq!(std::fs::read(installed.path).unwrap(), b"pinned");
    }

    #[tokio::test]
    async fn stale_artifacts_are_swept() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(404)
            .create_async()
            .await;

        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(".tunny-download-999999999-x.tar.gz"), b"partial").unwrap();
        std::fs::create_dir(root.path().join(".tunny-extract-999999999-y")).unwrap();

        let failure = provision(&config(root.path(), &server.url()))
            .await
            .unwrap_err();

        assert_eq!(failure.stage, Stage::Downloading);
        assert!(matches!(failure.source, ProvisionError::ReleaseNotFound { .. }));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
