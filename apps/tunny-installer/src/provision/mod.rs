//! Binary provisioning for the tunny CLI.
//!
//! This module resolves, downloads, validates and installs the prebuilt
//! `tunny` executable for the host platform.
//!
//! ## Modules
//!
//! - [`platform`] - Host OS/architecture to release token mapping
//! - [`release`] - Archive naming and download URL construction
//! - [`download`] - Streaming HTTP download with bounded redirects
//! - [`verify`] - Gzip signature and SHA-256 checks
//! - [`install`] - Extraction, binary discovery and atomic relocation
//! - [`scratch`] - Run-scoped temporary files under the install root
//! - [`orchestrator`] - The stage-by-stage pipeline
//!
//! ## Install Layout
//!
//! ```text
//! ~/.tunny/bin/
//! ├── tunny                          # Installed executable
//! ├── .tunny-download-<pid>-XXXX.tar.gz   # Archive, only during a run
//! └── .tunny-extract-<pid>-XXXX/          # Scratch directory, only during a run
//! ```

pub mod download;
pub mod install;
pub mod orchestrator;
pub mod platform;
pub mod release;
pub mod scratch;
pub mod verify;

pub use download::{DownloadArtifact, fetch};
pub use install::InstalledBinary;
pub use orchestrator::{ProvisionFailure, Stage, provision};
pub use platform::{ArchToken, OsToken, Platform};
pub use release::{ReleaseDescriptor, TargetSpec};
