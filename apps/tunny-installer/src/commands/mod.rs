//! Subcommands of `tunny-install`.
//!
//! - [`install`] - Download and install the `tunny` binary
//! - [`info`] - Show where the binary is installed

pub mod info;
pub mod install;
