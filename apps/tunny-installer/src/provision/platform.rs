//! Platform resolution for release artifacts.
//!
//! Maps host operating-system and CPU-architecture identifiers onto the
//! tokens used in release archive names. The tables are closed: an
//! identifier outside them is an error, never a guess.
//!
//! ## Supported Platforms
//!
//! | Host OS identifiers      | Token     |
//! |--------------------------|-----------|
//! | `linux`                  | `linux`   |
//! | `macos`, `darwin`        | `darwin`  |
//! | `windows`, `win32`       | `windows` |
//!
//! | Host arch identifiers        | Token   |
//! |------------------------------|---------|
//! | `x86_64`, `amd64`, `x64`     | `amd64` |
//! | `aarch64`, `arm64`           | `arm64` |
//!
//! Tokens are lowercase and must match the release publisher's archive names
//! exactly.

use std::fmt;

use crate::errors::ProvisionError;

/// Operating-system token used in archive names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsToken {
    /// Linux
    Linux,
    /// macOS
    Darwin,
    /// Windows
    Windows,
}

impl OsToken {
    /// Returns the token string as it appears in archive names.
    #[must_use = "returns the token string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }

    fn from_host(os: &str) -> Option<Self> {
        match os {
            "linux" => Some(Self::Linux),
            "macos" | "darwin" => Some(Self::Darwin),
            "windows" | "win32" => Some(Self::Windows),
            _ => None,
        }
    }
}

/// CPU-architecture token used in archive names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchToken {
    /// 64-bit x86
    Amd64,
    /// 64-bit ARM
    Arm64,
}

impl ArchToken {
    /// Returns the token string as it appears in archive names.
    #[must_use = "returns the token string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }

    fn from_host(arch: &str) -> Option<Self> {
        match arch {
            "x86_64" | "amd64" | "x64" => Some(Self::Amd64),
            "aarch64" | "arm64" => Some(Self::Arm64),
            _ => None,
        }
    }
}

/// A resolved (OS, architecture) pair with a published release artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Operating-system token.
    pub os: OsToken,
    /// Architecture token.
    pub arch: ArchToken,
}

impl Platform {
    /// Resolves host identifiers into release naming tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnsupportedPlatform`] naming both inputs when
    /// either identifier is outside the supported tables.
    pub fn resolve(os: &str, arch: &str) -> Result<Self, ProvisionError> {
        match (OsToken::from_host(os), ArchToken::from_host(arch)) {
            (Some(os), Some(arch)) => Ok(Self { os, arch }),
            _ => Err(ProvisionError::unsupported_platform(os, arch)),
        }
    }

    /// Returns the executable file extension for this platform.
    ///
    /// Returns `.exe` on Windows, empty string on Unix platforms.
    #[must_use = "returns the extension string without side effects"]
    pub fn executable_extension(self) -> &'static str {
        match self.os {
            OsToken::Windows => ".exe",
            OsToken::Linux | OsToken::Darwin => "",
        }
    }

    /// Returns whether installed binaries need Unix permission bits.
    #[must_use = "returns platform check result without side effects"]
    pub fn needs_exec_bit(self) -> bool {
        !matches!(self.os, OsToken::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os.as_str(), self.arch.as_str())
    }
}
