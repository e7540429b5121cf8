//! Error types for the StackQL client.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for StackQL client operations.
///
/// Every variant carries the text of its underlying cause so a failure can be
/// diagnosed from the message alone.
#[derive(Debug, Error)]
pub enum Error {
    /// The host operating system has no published StackQL build
    #[error("Unsupported OS type: {0}")]
    UnsupportedPlatform(String),

    /// A configuration value is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The release archive could not be fetched
    #[error("Failed to download {url}: {reason}")]
    Download {
        /// Archive URL
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// The release archive could not be unpacked
    #[error("Failed to unpack stackql: {0}")]
    Unpack(String),

    /// The executable bit could not be set on the installed binary
    #[error("Failed to make {} executable: {source}", path.display())]
    Permission {
        /// Binary path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// A subprocess could not be launched at all
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        /// Program that was launched
        program: String,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// A subprocess exited with a non-zero status
    #[error("Command failed: {0}")]
    CommandExecution(String),

    /// The server could not be reached within the retry budget
    #[error("Could not connect to the server after {attempts} attempts: {source}")]
    Connection {
        /// Number of attempts made
        attempts: u32,
        /// Last failure observed
        #[source]
        source: Box<Error>,
    },

    /// The Postgres wire protocol client reported a failure
    #[error("Wire protocol error: {0}")]
    Wire(String),

    /// A combination of settings that is valid on its own but not together
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// A query failed
    #[error("StackQL query failed: {0}")]
    QueryExecution(String),

    /// `stackql --version` produced output that could not be understood
    #[error("Failed to parse version output: {0}")]
    VersionParse(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a download error for `url`.
    pub fn download(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// A specialized `Result` type for StackQL client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_connection_error_wraps_last_failure() {
        let last = Error::Configuration("connection refused".to_string());
        let err = Error::Connection {
            attempts: 3,
            source: Box::new(last),
        };

        let message = err.to_string();
        assert!(message.contains("after 3 attempts"));
        assert!(message.contains("connection refused"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_download_error_includes_url() {
        let err = Error::download("https://example.com/a.zip", "timed out");
        assert_eq!(
            err.to_string(),
            "Failed to download https://example.com/a.zip: timed out"
        );
    }
}
