//! Install manifest - metadata about the archive behind the installed binary
//!
//! Written into the cache directory after every successful install. The
//! binary's presence alone decides whether an install is needed; the manifest
//! only records where it came from and what was downloaded.
//!
//! File format (binary):
//! [magic: u32 LE] [length: u32 LE] [bincode payload] [crc32: u32 LE]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stackql_core::format_version::{magic, manifest_version, MANIFEST_FORMAT_VERSION};
use stackql_core::{Error, Result};

/// Manifest file name inside the cache directory
pub const MANIFEST_FILE: &str = "install.manifest";

/// Record of one successful install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallManifest {
    /// Format version for compatibility
    pub format_version: u16,
    /// OS identifier the archive was published for
    pub os: String,
    /// URL the archive was fetched from
    pub download_url: String,
    /// Archive file name inside the cache directory
    pub archive_name: String,
    /// Archive size in bytes
    pub archive_size: u64,
    /// CRC32 of the archive contents
    pub archive_crc32: u32,
    /// Binary location relative to the cache directory
    pub binary_relative_path: String,
    /// Install time (seconds since UNIX epoch)
    pub installed_at: u64,
}

impl InstallManifest {
    /// Encode the manifest with its framing and checksum
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload =
            bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))?;
        let crc = crc32fast::hash(&payload);

        let mut buf = Vec::with_capacity(payload.len() + 12);
        buf.extend_from_slice(&magic::MANIFEST.to_le_bytes());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Decode a framed manifest, validating magic, length, checksum and version
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 12 {
            return Err(Error::Serialization("manifest too short".to_string()));
        }

        let magic_bytes = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if magic_bytes != magic::MANIFEST {
            return Err(Error::Serialization(format!(
                "invalid manifest magic: {:#x}",
                magic_bytes
            )));
        }

        let len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let framed_len = len.checked_add(12).ok_or_else(|| {
            Error::Serialization(format!("manifest length {} overflows framing", len))
        })?;
        if data.len() != framed_len {
            return Err(Error::Serialization(format!(
                "manifest length mismatch: header says {} bytes, file has {}",
                len,
                data.len().saturating_sub(12)
            )));
        }

        let payload = &data[8..8 + len];
        let stored_crc = u32::from_le_bytes([
            data[8 + len],
            data[9 + len],
            data[10 + len],
            data[11 + len],
        ]);
        let computed_crc = crc32fast::hash(payload);
        if stored_crc != computed_crc {
            return Err(Error::Serialization(format!(
                "manifest CRC mismatch: expected {:#x}, got {:#x}",
                stored_crc, computed_crc
            )));
        }

        let manifest: InstallManifest =
            bincode::deserialize(payload).map_err(|e| Error::Serialization(e.to_string()))?;

        if !manifest_version().can_read(manifest.format_version) {
            return Err(Error::Serialization(format!(
                "unsupported manifest version {} (current {})",
                manifest.format_version, MANIFEST_FORMAT_VERSION
            )));
        }

        Ok(manifest)
    }

    /// Write the manifest into `dir`
    pub fn save(&self, dir: &Path) -> Result<()> {
        let encoded = self.encode()?;
        let path = dir.join(MANIFEST_FILE);
        let tmp_path = dir.join(format!("{}.tmp", MANIFEST_FILE));

        fs::write(&tmp_path, encoded)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Load the manifest from `dir`, or `None` if none was written
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_FILE);
        match fs::read(&path) {
            Ok(data) => Self::decode(&data).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
