//! # StackQL Server
//!
//! Connection to a StackQL instance running in server mode
//! (`stackql srv`), which speaks the Postgres wire protocol.
//!
//! ## ⚠️ Internal Implementation Detail
//!
//! **This crate is an internal implementation detail of the StackQL client.**
//!
//! Users should depend on the main [`stackql`](https://crates.io/crates/stackql) crate
//! instead, which provides the stable public API.

use std::time::Duration;

use async_trait::async_trait;
use stackql_core::{Error, Result};
use tracing::{info, warn};

pub mod session;

pub use session::{PgConnector, PgSession};

/// Environment variable whose value overrides any programmatic connection string
pub const CONNECTION_ENV_VAR: &str = "POSTGRES";

/// One result row: column name to text value (or null)
pub type JsonRow = serde_json::Map<String, serde_json::Value>;

/// Opens wire protocol sessions
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a session to the server at `url`
    async fn connect(&self, url: &str) -> Result<Box<dyn WireSession>>;
}

/// What one statement sent back
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOutcome {
    /// Result rows, empty for statements that return none
    pub rows: Vec<JsonRow>,
    /// Rows affected as reported by the server's completion messages
    pub rows_affected: u64,
}

impl StatementOutcome {
    /// Render the outcome as text.
    ///
    /// Rows become a JSON array; a statement without rows becomes a short
    /// completion message.
    pub fn to_text(&self) -> Result<String> {
        if self.rows.is_empty() {
            return Ok(format!(
                "statement executed, {} rows affected",
                self.rows_affected
            ));
        }
        serde_json::to_string(&self.rows).map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// A live wire protocol session
#[async_trait]
pub trait WireSession: Send {
    /// Run `sql` and return everything it produced
    async fn run(&mut self, sql: &str) -> Result<StatementOutcome>;

    /// Terminate the session gracefully
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Retry behaviour for establishing a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total connection attempts, including the first
    pub max_attempts: u32,
    /// Fixed wait between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Pick the effective connection string.
///
/// `env_value` (the `POSTGRES` variable) wins over `explicit`; with neither
/// the result is a configuration error.
pub fn resolve_connection_string(
    env_value: Option<String>,
    explicit: Option<&str>,
) -> Result<String> {
    env_value
        .filter(|v| !v.is_empty())
        .or_else(|| explicit.map(str::to_string))
        .ok_or_else(|| {
            Error::Configuration(format!(
                "Connection string not found. Please set the {} environment variable or pass the connection string as an argument",
                CONNECTION_ENV_VAR
            ))
        })
}

/// Establishes connections with bounded, fixed-delay retry
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    policy: RetryPolicy,
}

impl ConnectionManager {
    /// Manager using the sqlx Postgres connector and the default retry policy
    pub fn new() -> Self {
        Self::with_connector(PgConnector, RetryPolicy::default())
    }

    /// Manager with a custom connector and retry policy
    pub fn with_connector(connector: impl Connector + 'static, policy: RetryPolicy) -> Self {
        Self::with_boxed_connector(Box::new(connector), policy)
    }

    /// Manager from an already boxed connector
    pub fn with_boxed_connector(connector: Box<dyn Connector>, policy: RetryPolicy) -> Self {
        Self { connector, policy }
    }

    /// Get the retry policy
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Connect using the `POSTGRES` environment variable or `connection_string`.
    pub async fn connect(&self, connection_string: Option<&str>) -> Result<ConnectionHandle> {
        let url = resolve_connection_string(
            std::env::var(CONNECTION_ENV_VAR).ok(),
            connection_string,
        )?;
        self.connect_to(&url).await
    }

    /// Connect to `url`, retrying up to the policy's attempt budget.
    ///
    /// After the last failed attempt the error is [`Error::Connection`]
    /// wrapping the final underlying failure.
    pub async fn connect_to(&self, url: &str) -> Result<ConnectionHandle> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            info!(attempt, max_attempts, "connecting to stackql server");
            match self.connector.connect(url).await {
                Ok(session) => {
                    info!(attempt, "connected");
                    return Ok(ConnectionHandle {
                        session: Some(session),
                    });
                }
                Err(err) => {
                    warn!(attempt, error = %err, "connection attempt failed");
                    if attempt >= max_attempts {
                        return Err(Error::Connection {
                            attempts: attempt,
                            source: Box::new(err),
                        });
                    }
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns a live server session until it is closed
pub struct ConnectionHandle {
    session: Option<Box<dyn WireSession>>,
}

impl ConnectionHandle {
    /// Check if the session is still open
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Run `sql` over the session and return its rows
    pub async fn query(&mut self, sql: &str) -> Result<Vec<JsonRow>> {
        Ok(self.session()?.run(sql).await?.rows)
    }

    /// Run a statement over the session and return its outcome as text
    pub async fn execute_statement(&mut self, sql: &str) -> Result<String> {
        self.session()?.run(sql).await?.to_text()
    }

    fn session(&mut self) -> Result<&mut Box<dyn WireSession>> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::QueryExecution("server connection is closed".to_string()))
    }

    /// Close the session. Closing an already closed handle does nothing.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(session) = self.session.take() {
            session.close().await?;
            info!("server connection closed");
        }
        Ok(())
    }
}
