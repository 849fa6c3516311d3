#![warn(clippy::pedantic)]

//! # tunny launcher
//!
//! Thin wrapper that runs the installed `tunny` executable. All arguments are
//! passed through unchanged, stdio and environment are inherited, and the
//! child's exit code becomes this process's exit code.

use anyhow::{Context, Result, bail};
use std::process::Command;
use tunny_installer::config::InstallConfig;
use tunny_installer::logging;
use tunny_installer::metadata::PackageMetadata;

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:?}");
            std::process::exit(1);
        }
    }
}

/// Spawns the installed binary and waits for it.
///
/// Returns the child's exit code, or 1 when it was terminated by a signal.
fn run() -> Result<i32> {
    let config = InstallConfig::from_env()?;
    let metadata = PackageMetadata::resolve(&config);

    if !metadata.is_installed() {
        bail!(
            "tunny binary not found at {}\n\
             Run 'tunny-install' to install it.",
            metadata.binary_path.display()
        );
    }

    tracing::debug!(binary = %metadata.binary_path.display(), "launching");
    let status = Command::new(&metadata.binary_path)
        .args(std::env::args_os().skip(1))
        .status()
        .with_context(|| format!("Failed to execute {}", metadata.binary_path.display()))?;

    Ok(status.code().unwrap_or(1))
}
