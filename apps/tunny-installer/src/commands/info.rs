//! Info command for `tunny-install`.
//!
//! Prints the package name, configured version and the path the binary is
//! (or would be) installed at.

use anyhow::Result;
use clap::Args;

use tunny_installer::config::InstallConfig;
use tunny_installer::metadata::PackageMetadata;

/// Arguments for the info command.
#[derive(Args, Debug, Default)]
pub struct InfoArgs {
    /// Print machine-readable JSON.
    #[clap(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

/// Executes the info command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(args: &InfoArgs, config: &InstallConfig) -> Result<()> {
    let metadata = PackageMetadata::resolve(config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!("package:   {}", metadata.name);
    println!("version:   {}", metadata.version);
    println!("binary:    {}", metadata.binary_path.display());
    println!(
        "installed: {}",
        if metadata.is_installed() { "yes" } else { "no" }
    );
    Ok(())
}
