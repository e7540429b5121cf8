// Common test utilities for installer integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stackql_core::{Error, Result};
use stackql_installer::ArchiveSource;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Shell script used as the unpacked StackQL binary
pub const FAKE_BINARY: &[u8] = b"#!/bin/sh\necho 'stackql v0.0.1 (0000000)'\n";

/// Build an in-memory zip archive holding the given entries
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("Failed to start entry");
        writer.write_all(data).expect("Failed to write entry");
    }
    writer.finish().expect("Failed to finish zip").into_inner()
}

/// Archive source serving fixed bytes and recording every fetch
#[derive(Clone)]
pub struct FakeSource {
    payload: Option<Vec<u8>>,
    fetches: Arc<AtomicUsize>,
    watched: Option<PathBuf>,
    /// Whether `watched` existed at the moment of each fetch
    pub observed: Arc<Mutex<Vec<bool>>>,
}

impl FakeSource {
    pub fn serving(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            fetches: Arc::new(AtomicUsize::new(0)),
            watched: None,
            observed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A source whose every fetch fails like an unreachable host
    pub fn failing() -> Self {
        Self {
            payload: None,
            ..Self::serving(Vec::new())
        }
    }

    /// Record whether `path` exists each time an archive is fetched
    pub fn watching(mut self, path: impl Into<PathBuf>) -> Self {
        self.watched = Some(path.into());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn observations(&self) -> Vec<bool> {
        self.observed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveSource for FakeSource {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(watched) = &self.watched {
            self.observed.lock().unwrap().push(watched.exists());
        }

        match &self.payload {
            Some(bytes) => {
                std::fs::write(dest, bytes)?;
                Ok(bytes.len() as u64)
            }
            None => Err(Error::download(url, "connection refused")),
        }
    }
}

/// Test fixture that owns a temporary working area
pub struct InstallFixture {
    pub temp_dir: TempDir,
    pub cache_dir: PathBuf,
}

impl InstallFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cache_dir = temp_dir.path().join(".stackql");
        Self {
            temp_dir,
            cache_dir,
        }
    }

    /// Write an executable shell script into the fixture directory
    #[cfg(unix)]
    pub fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, body).expect("Failed to write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod script");
        path
    }

    /// A stand-in for `pkgutil --expand-full <pkg> <dest>` that lays out
    /// `<dest>/Payload/stackql`
    #[cfg(unix)]
    pub fn fake_pkgutil(&self) -> PathBuf {
        self.script(
            "pkgutil",
            "#!/bin/sh\n\
             [ \"$1\" = \"--expand-full\" ] || { echo \"unexpected flag $1\" >&2; exit 2; }\n\
             [ -f \"$2\" ] || { echo \"missing package $2\" >&2; exit 2; }\n\
             mkdir -p \"$3/Payload\" && printf '#!/bin/sh\\necho ok\\n' > \"$3/Payload/stackql\"\n",
        )
    }

    /// A stand-in for `pkgutil` that always fails
    #[cfg(unix)]
    pub fn broken_pkgutil(&self) -> PathBuf {
        self.script(
            "pkgutil-broken",
            "#!/bin/sh\necho 'Error: bad package' >&2\nexit 1\n",
        )
    }
}

impl Default for InstallFixture {
    fn default() -> Self {
        Self::new()
    }
}
