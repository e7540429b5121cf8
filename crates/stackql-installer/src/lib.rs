//! # StackQL Installer
//!
//! Provisions the StackQL binary: resolves the release artifact for the host,
//! downloads it into a cache directory, unpacks it, and marks it executable.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of the StackQL client.**
//!
//! Users should depend on the main [`stackql`](https://crates.io/crates/stackql) crate
//! instead, which provides the stable public API.
//!
//! ## Install state machine
//!
//! - **Fast path**: the binary already exists in the cache directory. Its
//!   executable bit is (re)applied and it is returned without any download.
//! - **Install**: create the cache directory, download the archive, unpack it
//!   with the platform's strategy, set the executable bit, write the manifest.
//! - **Upgrade**: always downloads. The package-based platform removes the
//!   whole cache directory first; zip-based platforms unpack over it.
//!
//! Downloads are never retried. The cache directory is not locked, so two
//! processes installing into the same directory at once may race.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use stackql_core::format_version::MANIFEST_FORMAT_VERSION;
use stackql_core::{platform, Error, PlatformDescriptor, Result, UnpackStrategy, CACHE_DIR_NAME};
use tracing::{debug, info};

pub mod manifest;
pub mod source;
pub mod unpack;

pub use manifest::InstallManifest;
pub use source::{ArchiveSource, HttpSource};

#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Installer configuration options
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Release artifact to install
    pub platform: PlatformDescriptor,
    /// Directory the archive is downloaded and unpacked into
    pub cache_dir: PathBuf,
    /// Tool used by the platform-package unpack strategy
    pub package_tool: PathBuf,
}

impl InstallerConfig {
    /// Configuration for `platform` installing into `cache_dir`
    pub fn new(platform: PlatformDescriptor, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            cache_dir: cache_dir.into(),
            package_tool: PathBuf::from(unpack::DEFAULT_PACKAGE_TOOL),
        }
    }

    /// Configuration for the running host, installing into `.stackql` under
    /// the current working directory
    pub fn for_host() -> Result<Self> {
        Ok(Self::new(platform::current()?, default_cache_dir()?))
    }

    /// Set the tool used to expand platform packages
    pub fn with_package_tool(mut self, tool: impl Into<PathBuf>) -> Self {
        self.package_tool = tool.into();
        self
    }
}

/// The `.stackql` directory under the current working directory
pub fn default_cache_dir() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join(CACHE_DIR_NAME))
}

/// A StackQL binary present on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    /// Absolute location of the binary
    pub path: PathBuf,
    /// Whether the executable bit is set
    pub executable: bool,
}

/// Installs and upgrades the StackQL binary in a cache directory
pub struct Installer {
    config: InstallerConfig,
    source: Box<dyn ArchiveSource>,
}

impl Installer {
    /// Create an installer that downloads over HTTP
    pub fn new(config: InstallerConfig) -> Result<Self> {
        Ok(Self::with_source(config, HttpSource::new()?))
    }

    /// Create an installer with a custom archive source
    pub fn with_source(config: InstallerConfig, source: impl ArchiveSource + 'static) -> Self {
        Self {
            config,
            source: Box::new(source),
        }
    }

    /// Create an installer from an already boxed archive source
    pub fn with_boxed_source(config: InstallerConfig, source: Box<dyn ArchiveSource>) -> Self {
        Self { config, source }
    }

    /// Get the current configuration
    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// Where the binary lives once installed
    pub fn binary_path(&self) -> PathBuf {
        self.config
            .cache_dir
            .join(self.config.platform.binary_relative_path)
    }

    /// Check whether the binary is already present
    pub fn is_installed(&self) -> bool {
        self.binary_path().is_file()
    }

    /// Ensure the binary is installed, downloading it only if it is missing.
    pub async fn ensure_installed(&self) -> Result<InstalledBinary> {
        let binary_path = self.binary_path();
        if binary_path.is_file() {
            info!(path = %binary_path.display(), "stackql is already installed");
            let executable = set_executable(&binary_path).await?;
            return Ok(InstalledBinary {
                path: absolute(&binary_path)?,
                executable,
            });
        }

        self.install().await
    }

    /// Force a fresh download and install.
    ///
    /// On the package-based platform the whole cache directory is removed
    /// first; elsewhere the new archive is unpacked over the existing files.
    pub async fn upgrade(&self) -> Result<InstalledBinary> {
        if self.config.platform.requires_clean_reinstall() {
            info!(dir = %self.config.cache_dir.display(), "removing cache directory before upgrade");
            self.remove().await?;
        }
        self.install().await
    }

    /// Remove the cache directory and everything in it
    pub async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.config.cache_dir).await {
            Ok(()) => {
                debug!(dir = %self.config.cache_dir.display(), "cache directory removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read the manifest written by the last successful install
    pub fn installed_manifest(&self) -> Result<Option<InstallManifest>> {
        InstallManifest::load(&self.config.cache_dir)
    }

    async fn install(&self) -> Result<InstalledBinary> {
        let platform = &self.config.platform;
        let cache_dir = &self.config.cache_dir;
        tokio::fs::create_dir_all(cache_dir).await?;

        let archive_path = cache_dir.join(platform.archive_name());
        info!(url = platform.download_url, "downloading stackql binary");
        let archive_size = self.source.fetch(platform.download_url, &archive_path).await?;
        let archive_crc32 = checksum(&archive_path).await?;
        info!(bytes = archive_size, crc32 = %format!("{:#010x}", archive_crc32), "download complete");

        info!(strategy = ?platform.unpack_strategy, "unpacking stackql binary");
        match platform.unpack_strategy {
            UnpackStrategy::Zip => unpack::unzip(&archive_path, cache_dir).await?,
            UnpackStrategy::PlatformPackage => {
                unpack::expand_package(&self.config.package_tool, &archive_path, cache_dir).await?
            }
        }

        let binary_path = self.binary_path();
        if !binary_path.is_file() {
            return Err(Error::Unpack(format!(
                "archive {} did not contain {}",
                platform.archive_name(),
                platform.binary_relative_path
            )));
        }
        let executable = set_executable(&binary_path).await?;

        let manifest = InstallManifest {
            format_version: MANIFEST_FORMAT_VERSION,
            os: platform.os.to_string(),
            download_url: platform.download_url.to_string(),
            archive_name: platform.archive_name().to_string(),
            archive_size,
            archive_crc32,
            binary_relative_path: platform.binary_relative_path.to_string(),
            installed_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        manifest.save(cache_dir)?;

        info!(path = %binary_path.display(), "stackql installed");
        Ok(InstalledBinary {
            path: absolute(&binary_path)?,
            executable,
        })
    }
}

/// CRC32 of a file, computed off the async runtime
async fn checksum(path: &Path) -> Result<u32> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<u32> {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = crc32fast::Hasher::new();
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hasher.finalize())
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

#[cfg(unix)]
async fn set_executable(path: &Path) -> Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE))
        .await
        .map_err(|source| Error::Permission {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(true)
}

// Windows has no executable bit; an existing .exe is runnable.
#[cfg(not(unix))]
async fn set_executable(path: &Path) -> Result<bool> {
    Ok(path.is_file())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_binary_path_per_platform() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        for (os, expected) in [
            ("linux", "stackql"),
            ("windows", "stackql.exe"),
            ("darwin", "stackql/Payload/stackql"),
        ] {
            let config = InstallerConfig::new(platform::resolve(os).unwrap(), temp_dir.path());
            let installer = Installer::new(config).expect("Failed to create installer");
            assert_eq!(installer.binary_path(), temp_dir.path().join(expected));
            assert!(!installer.is_installed());
        }
    }

    #[test]
    fn test_default_package_tool() {
        let config = InstallerConfig::new(platform::resolve("darwin").unwrap(), "/tmp/x");
        assert_eq!(config.package_tool, PathBuf::from("pkgutil"));

        let config = config.with_package_tool("/usr/local/bin/fake-pkgutil");
        assert_eq!(config.package_tool, PathBuf::from("/usr/local/bin/fake-pkgutil"));
    }

    #[tokio::test]
    async fn test_remove_missing_dir_is_noop() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = InstallerConfig::new(
            platform::resolve("linux").unwrap(),
            temp_dir.path().join("never-created"),
        );
        let installer = Installer::new(config).expect("Failed to create installer");

        installer.remove().await.expect("remove should be a no-op");
        installer.remove().await.expect("remove should be a no-op");
    }
}
