//! Platform resolution
//!
//! Maps an operating system identifier to the release artifact published for
//! it: where to download it from, where the binary lands once unpacked, and
//! how the archive is unpacked. All OS-specific knowledge lives here.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Operating systems with a published StackQL build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// Linux, amd64
    Linux,
    /// Windows, amd64
    Windows,
    /// macOS, universal package
    Darwin,
}

impl Os {
    /// Identifier used in release names and in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::Darwin => "darwin",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Os {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linux" => Ok(Os::Linux),
            "windows" => Ok(Os::Windows),
            "darwin" => Ok(Os::Darwin),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }
}

/// How a downloaded archive is turned into a binary on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackStrategy {
    /// Extract every entry of a zip archive into the cache directory
    Zip,
    /// Expand a macOS installer package with `pkgutil`
    PlatformPackage,
}

/// Release artifact published for one operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformDescriptor {
    /// Operating system this artifact targets
    pub os: Os,
    /// Fixed "latest" release URL
    pub download_url: &'static str,
    /// Binary location relative to the cache directory once unpacked
    pub binary_relative_path: &'static str,
    /// Unpack strategy for the archive format
    pub unpack_strategy: UnpackStrategy,
}

const LINUX: PlatformDescriptor = PlatformDescriptor {
    os: Os::Linux,
    download_url: "https://releases.stackql.io/stackql/latest/stackql_linux_amd64.zip",
    binary_relative_path: "stackql",
    unpack_strategy: UnpackStrategy::Zip,
};

const WINDOWS: PlatformDescriptor = PlatformDescriptor {
    os: Os::Windows,
    download_url: "https://releases.stackql.io/stackql/latest/stackql_windows_amd64.zip",
    binary_relative_path: "stackql.exe",
    unpack_strategy: UnpackStrategy::Zip,
};

const DARWIN: PlatformDescriptor = PlatformDescriptor {
    os: Os::Darwin,
    download_url:
        "https://storage.googleapis.com/stackql-public-releases/latest/stackql_darwin_multiarch.pkg",
    binary_relative_path: "stackql/Payload/stackql",
    unpack_strategy: UnpackStrategy::PlatformPackage,
};

impl PlatformDescriptor {
    /// Descriptor for a known OS
    pub fn for_os(os: Os) -> Self {
        match os {
            Os::Linux => LINUX,
            Os::Windows => WINDOWS,
            Os::Darwin => DARWIN,
        }
    }

    /// File name the archive is saved under (last segment of the URL)
    pub fn archive_name(&self) -> &'static str {
        self.download_url
            .rsplit('/')
            .next()
            .unwrap_or(self.download_url)
    }

    /// Whether an upgrade must wipe the cache directory before reinstalling.
    ///
    /// Expanding a package over an existing payload is unreliable, so the
    /// package-based platform always starts from an empty directory.
    pub fn requires_clean_reinstall(&self) -> bool {
        self.unpack_strategy == UnpackStrategy::PlatformPackage
    }
}

/// Resolve the release artifact for an OS identifier.
///
/// Accepts `linux`, `windows` and `darwin`; anything else fails with
/// [`Error::UnsupportedPlatform`].
pub fn resolve(os: &str) -> Result<PlatformDescriptor> {
    os.parse::<Os>().map(PlatformDescriptor::for_os)
}

/// Resolve the release artifact for the running host
pub fn current() -> Result<PlatformDescriptor> {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    resolve(os)
}
