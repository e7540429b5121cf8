//! On-disk format versions for files the client writes into its cache
//! directory.
//!
//! Readers check the version before trusting a file so that a cache written
//! by a newer client is ignored rather than misread.

/// Install manifest format version
pub const MANIFEST_FORMAT_VERSION: u16 = 1;

/// Magic numbers for file validation
pub mod magic {
    /// Install manifest magic: "SQMF" (StackQL ManiFest)
    pub const MANIFEST: u32 = 0x53514D46;
}

/// Version compatibility information
pub struct FormatVersion {
    /// Current version of this format
    pub current: u16,
    /// Minimum supported version for reading
    pub min_read: u16,
}

impl FormatVersion {
    /// Check if a version can be read
    pub fn can_read(&self, version: u16) -> bool {
        version >= self.min_read && version <= self.current
    }
}

/// Install manifest format version info
pub fn manifest_version() -> FormatVersion {
    FormatVersion {
        current: MANIFEST_FORMAT_VERSION,
        min_read: 1,
    }
}
