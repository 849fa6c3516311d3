#![warn(clippy::pedantic)]

//! # tunny installer
//!
//! Provisions the prebuilt `tunny` executable for the host platform and
//! exposes where it was installed.
//!
//! ```text
//! resolve platform -> build URL -> download -> validate -> extract -> install
//! ```
//!
//! Two binaries are built on top of this library:
//!
//! - `tunny-install` runs the pipeline ([`provision::provision`])
//! - `tunny` forwards its arguments to the installed executable
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use tunny_installer::config::InstallConfig;
//!
//! let config = InstallConfig::from_env()?.version("1.2.0");
//! let installed = tunny_installer::provision::provision(&config).await?;
//! println!("{}", installed.path.display());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod logging;
pub mod metadata;
pub mod provision;
