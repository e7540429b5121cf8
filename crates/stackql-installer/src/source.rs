//! Archive sources
//!
//! An [`ArchiveSource`] writes the release archive behind a URL to a local
//! file. The installer only depends on the trait; [`HttpSource`] is the
//! production implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use stackql_core::{Error, Result};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Fetches a release archive into a local file
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Write the archive behind `url` to `dest`, returning the bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// HTTP(S) archive source backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    /// Create a source with default connection settings
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::download("", format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Create a source around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::download(url, e))?;

        let mut file = File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| Error::download(url, e))? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(Error::download(url, "server returned an empty archive"));
        }
        Ok(written)
    }
}

#[async_trait]
impl ArchiveSource for HttpSource {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!(url, dest = %dest.display(), "fetching archive");
        match self.stream_to_file(url, dest).await {
            Ok(written) => Ok(written),
            Err(err) => {
                // The download error already explains the failure
                if let Err(cleanup) = tokio::fs::remove_file(dest).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!(dest = %dest.display(), error = %cleanup, "failed to remove partial download");
                    }
                }
                Err(match err {
                    Error::Io(e) => Error::download(url, e),
                    other => other,
                })
            }
        }
    }
}
