#![warn(clippy::pedantic)]

//! # tunny-install
//!
//! Downloads the prebuilt `tunny` executable for the host platform and
//! installs it into `~/.tunny/bin` (or `TUNNY_HOME`).
//!
//! ## Subcommands
//!
//! - `install` - Install a version (the default when no subcommand is given)
//! - `info` - Show where the binary is installed
//!
//! ## Exit Codes
//!
//! `0` on success, `1` on any failure. A failed install prints a single
//! line naming the stage that failed.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{info, install};
use std::path::PathBuf;
use tunny_installer::config::InstallConfig;
use tunny_installer::logging;
use tunny_installer::provision::ProvisionFailure;

/// Installer for the tunny CLI.
#[derive(Parser)]
#[command(
    name = "tunny-install",
    author,
    version,
    about = "Installs the prebuilt tunny binary for this platform",
    after_help = "\
ENVIRONMENT VARIABLES:
    TUNNY_HOME          Install directory (default: ~/.tunny/bin)
    TUNNY_DIST_SERVER   Release base URL (default: https://github.com/tunny-dev/tunny/releases/download)
    TUNNY_VERSION       Version to install (default: this installer's version)
    TUNNY_SHA256        Expected SHA-256 of the release archive
    RUST_LOG            Diagnostic log filter (default: warn)"
)]
pub struct Cli {
    /// Install directory. Overrides `TUNNY_HOME`.
    #[clap(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Download and install the tunny binary.
    ///
    /// Resolves the release archive for the host platform, downloads and
    /// validates it, and moves the executable into the install directory.
    Install(install::InstallArgs),

    /// Show the installed binary's location.
    Info(info::InfoArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init();
    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints an error and returns the exit code.
///
/// Pipeline failures are printed as one line naming the failed stage; other
/// errors are printed with their context chain.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(failure) = e.downcast_ref::<ProvisionFailure>() {
        eprintln!("Error: {failure}");
    } else {
        eprintln!("Error: {e:?}");
    }
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = InstallConfig::from_env()?;
    if let Some(root) = cli.root {
        config = config.install_root(root);
    }

    match cli.command {
        Some(Commands::Install(args)) => install::execute(&args, config).await,
        Some(Commands::Info(args)) => info::execute(&args, &config),
        None => install::execute(&install::InstallArgs::default(), config).await,
    }
}
