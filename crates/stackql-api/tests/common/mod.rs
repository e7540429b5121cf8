// Common test utilities for client integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use stackql::{ArchiveSource, Connector, Error, JsonRow, Result, StatementOutcome, WireSession};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

pub const VERSION_LINE: &str = "stackql v1.2.3 (abcdef1)";
pub const UPGRADED_VERSION_LINE: &str = "stackql v2.0.0 fedcba9 (fedcba9) BuildDate: 2024-06-01";
pub const PROVIDERS_JSON: &str = r#"[{"name":"aws","version":"v24.07.00"}]"#;
pub const PULL_MESSAGE: &str = "github provider, version 'v24.06.00' successfully installed";

/// Test fixture owning a scratch directory and the invocation log the fake
/// binary appends to
pub struct ClientFixture {
    pub temp_dir: TempDir,
    pub cache_dir: PathBuf,
    pub log: PathBuf,
}

impl ClientFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cache_dir = temp_dir.path().join(".stackql");
        let log = temp_dir.path().join("invocations.log");
        Self {
            temp_dir,
            cache_dir,
            log,
        }
    }

    /// Shell script standing in for the StackQL binary
    ///
    /// Records its arguments, answers `--version` with `version_line`, prints
    /// a JSON result for `exec`, fails on the query `BAD QUERY`, and reports
    /// `REGISTRY PULL github` on stderr only.
    pub fn binary_script(&self, version_line: &str) -> String {
        format!(
            "#!/bin/sh\n\
             echo \"$*\" >> '{log}'\n\
             case \"$1\" in\n\
             --version) echo '{version_line}' ;;\n\
             exec)\n\
             if [ \"$2\" = \"BAD QUERY\" ]; then echo 'error: syntax error near BAD' >&2; exit 1; fi\n\
             if [ \"$2\" = \"REGISTRY PULL github\" ]; then echo \"{pulled}\" >&2; exit 0; fi\n\
             echo '{providers}' ;;\n\
             *) echo \"unknown command $1\" >&2; exit 2 ;;\n\
             esac\n",
            log = self.log.display(),
            version_line = version_line,
            providers = PROVIDERS_JSON,
            pulled = PULL_MESSAGE,
        )
    }

    /// Write the fake binary outside the cache directory
    #[cfg(unix)]
    pub fn preinstalled_binary(&self) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.temp_dir.path().join("bin");
        std::fs::create_dir_all(&dir).expect("Failed to create bin dir");
        let path = dir.join("stackql");
        std::fs::write(&path, self.binary_script(VERSION_LINE)).expect("Failed to write binary");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod binary");
        path
    }

    /// Zip archive laid out like the linux release, holding the fake binary
    pub fn release_archive(&self, version_line: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("stackql", SimpleFileOptions::default())
            .expect("Failed to start entry");
        writer
            .write_all(self.binary_script(version_line).as_bytes())
            .expect("Failed to write entry");
        writer.finish().expect("Failed to finish zip").into_inner()
    }

    /// Every recorded invocation of the fake binary, one per line
    pub fn invocations(&self) -> Vec<String> {
        match std::fs::read_to_string(&self.log) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

impl Default for ClientFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Archive source serving a sequence of payloads, one per fetch
///
/// Once the sequence is exhausted the last payload is served again.
#[derive(Clone)]
pub struct SequenceSource {
    payloads: Arc<Vec<Vec<u8>>>,
    fetches: Arc<AtomicUsize>,
}

impl SequenceSource {
    pub fn new(payloads: Vec<Vec<u8>>) -> Self {
        Self {
            payloads: Arc::new(payloads),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source that must never be used
    pub fn unreachable() -> Self {
        Self::new(Vec::new())
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveSource for SequenceSource {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        let payload = self
            .payloads
            .get(n)
            .or_else(|| self.payloads.last())
            .ok_or_else(|| Error::download(url, "connection refused"))?;
        std::fs::write(dest, payload)?;
        Ok(payload.len() as u64)
    }
}

/// Record of everything a [`FakeConnector`] and its sessions saw
#[derive(Default)]
pub struct ServerLog {
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub queries: Mutex<Vec<String>>,
}

impl ServerLog {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

/// Connector answering every query with fixed rows
///
/// Queries starting with `REGISTRY` return no rows, only an affected count.
#[derive(Clone)]
pub struct FakeConnector {
    pub log: Arc<ServerLog>,
    rows: Vec<JsonRow>,
    refuse: bool,
}

impl FakeConnector {
    pub fn serving(rows: Value) -> Self {
        let rows = match rows {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            log: Arc::new(ServerLog::default()),
            rows,
            refuse: false,
        }
    }

    pub fn providers() -> Self {
        Self::serving(json!([
            {"name": "aws", "version": "v24.07.00"},
            {"name": "github", "version": null}
        ]))
    }

    /// A connector whose every attempt is refused
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::serving(Value::Null)
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, _url: &str) -> Result<Box<dyn WireSession>> {
        let attempt = self.log.connects.fetch_add(1, Ordering::SeqCst) + 1;
        if self.refuse {
            return Err(Error::Wire(format!(
                "connection refused (attempt {})",
                attempt
            )));
        }
        Ok(Box::new(FakeSession {
            log: self.log.clone(),
            rows: self.rows.clone(),
        }))
    }
}

struct FakeSession {
    log: Arc<ServerLog>,
    rows: Vec<JsonRow>,
}

#[async_trait]
impl WireSession for FakeSession {
    async fn run(&mut self, sql: &str) -> Result<StatementOutcome> {
        self.log.queries.lock().unwrap().push(sql.to_string());
        if sql.starts_with("REGISTRY") {
            return Ok(StatementOutcome {
                rows: Vec::new(),
                rows_affected: 1,
            });
        }
        Ok(StatementOutcome {
            rows: self.rows.clone(),
            rows_affected: self.rows.len() as u64,
        })
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
