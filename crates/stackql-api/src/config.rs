//! Client configuration and its mapping onto StackQL command line flags
//!
//! [`ClientConfig`] enumerates every supported option. Enumerated values
//! (output format, proxy scheme) are carried as plain strings so a config can
//! be deserialized from any JSON document, and are validated when the client
//! is initialized.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stackql_core::{Error, Result};

use crate::auth::format_auth;

/// Where queries are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Run the StackQL binary as a subprocess
    #[default]
    Local,
    /// Talk to a StackQL server over the Postgres wire protocol
    Server,
}

impl Mode {
    /// Lowercase name of the mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Local => "local",
            Mode::Server => "server",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Mode::Local),
            "server" => Ok(Mode::Server),
            other => Err(Error::Configuration(format!(
                "invalid mode '{}', expected local or server",
                other
            ))),
        }
    }
}

/// Result format requested from the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON array of objects
    Json,
    /// Comma separated values (local mode only)
    Csv,
}

impl OutputFormat {
    /// Value passed to `--output`
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            // "object" asks for rows as JSON objects
            "json" | "object" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(Error::Configuration(format!(
                "invalid output format '{}', expected json or csv",
                other
            ))),
        }
    }
}

/// Scheme used to reach the HTTP proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    /// Plain HTTP
    Http,
    /// HTTP over TLS
    Https,
}

impl ProxyScheme {
    /// Value passed to `--http.proxy.scheme`
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyScheme::Http => "http",
            ProxyScheme::Https => "https",
        }
    }
}

impl FromStr for ProxyScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(ProxyScheme::Http),
            "https" => Ok(ProxyScheme::Https),
            other => Err(Error::Configuration(format!(
                "invalid proxy scheme '{}', expected http or https",
                other
            ))),
        }
    }
}

/// HTTP proxy the binary uses for provider API calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Proxy host name
    pub host: Option<String>,
    /// Proxy port
    pub port: Option<u16>,
    /// Proxy user
    pub user: Option<String>,
    /// Proxy password
    pub password: Option<String>,
    /// `http` or `https`
    pub scheme: Option<String>,
}

/// Client configuration
///
/// # Examples
///
/// ```rust
/// use stackql::{ClientConfig, Mode};
///
/// let config = ClientConfig::default()
///     .with_max_results(100)
///     .with_output_format("json");
/// assert_eq!(config.mode, Mode::Local);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Execution mode
    pub mode: Mode,
    /// Pre-installed StackQL binary to use instead of downloading one
    pub binary_path: Option<PathBuf>,
    /// `postgres://` URL of a StackQL server (server mode)
    pub connection_string: Option<String>,
    /// Maximum results per HTTP response from a provider
    pub max_results: Option<u32>,
    /// Maximum pages fetched per provider request
    pub page_limit: Option<u32>,
    /// Maximum depth of indirect queries
    pub max_depth: Option<u32>,
    /// Provider API request timeout in milliseconds
    pub api_timeout_ms: Option<u64>,
    /// HTTP proxy settings
    pub proxy: Option<ProxyConfig>,
    /// `json` (alias `object`) or `csv`
    pub output_format: Option<String>,
    /// Provider credentials, as a JSON document or a string holding one
    pub auth: Option<Value>,
    /// Directory the binary is installed into (defaults to `./.stackql`)
    pub cache_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Configuration for server mode
    pub fn server() -> Self {
        Self {
            mode: Mode::Server,
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// Reads `STACKQL_MODE`, `STACKQL_BINARY_PATH`, `STACKQL_OUTPUT`,
    /// `STACKQL_CACHE_DIR`, and `POSTGRES`. Unset variables leave the
    /// default in place.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let mut config = Self::default();
        if let Some(mode) = get("STACKQL_MODE") {
            config.mode = mode.parse()?;
        }
        config.binary_path = get("STACKQL_BINARY_PATH").map(PathBuf::from);
        config.output_format = get("STACKQL_OUTPUT");
        config.cache_dir = get("STACKQL_CACHE_DIR").map(PathBuf::from);
        config.connection_string = get(stackql_server::CONNECTION_ENV_VAR);
        Ok(config)
    }

    /// Set the execution mode
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Use a pre-installed binary
    pub fn with_binary_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    /// Set the server connection string
    pub fn with_connection_string<S: Into<String>>(mut self, url: S) -> Self {
        self.connection_string = Some(url.into());
        self
    }

    /// Set `--http.response.maxResults`
    pub fn with_max_results(mut self, value: u32) -> Self {
        self.max_results = Some(value);
        self
    }

    /// Set `--http.response.pageLimit`
    pub fn with_page_limit(mut self, value: u32) -> Self {
        self.page_limit = Some(value);
        self
    }

    /// Set `--indirect.depth.max`
    pub fn with_max_depth(mut self, value: u32) -> Self {
        self.max_depth = Some(value);
        self
    }

    /// Set `--apirequesttimeout`
    pub fn with_api_timeout_ms(mut self, value: u64) -> Self {
        self.api_timeout_ms = Some(value);
        self
    }

    /// Set the HTTP proxy
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Set the output format
    pub fn with_output_format<S: Into<String>>(mut self, format: S) -> Self {
        self.output_format = Some(format.into());
        self
    }

    /// Set provider credentials
    pub fn with_auth(mut self, auth: Value) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Install the binary into `dir`
    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// The validated output format, if one was configured
    pub fn output(&self) -> Result<Option<OutputFormat>> {
        self.output_format.as_deref().map(str::parse).transpose()
    }
}

/// Build the binary's command line flags from `config`
///
/// Flags come in contiguous name/value pairs in a fixed order; `--output` is
/// only emitted when an output format is configured.
pub fn build_flags(config: &ClientConfig) -> Result<Vec<String>> {
    let mut flags = Vec::new();
    let mut push = |name: &str, value: String| {
        flags.push(name.to_string());
        flags.push(value);
    };

    if let Some(v) = config.max_results {
        push("--http.response.maxResults", v.to_string());
    }
    if let Some(v) = config.page_limit {
        push("--http.response.pageLimit", v.to_string());
    }
    if let Some(v) = config.max_depth {
        push("--indirect.depth.max", v.to_string());
    }
    if let Some(v) = config.api_timeout_ms {
        push("--apirequesttimeout", v.to_string());
    }

    if let Some(proxy) = &config.proxy {
        if let Some(host) = &proxy.host {
            push("--http.proxy.host", host.clone());
        }
        if let Some(port) = proxy.port {
            push("--http.proxy.port", port.to_string());
        }
        if let Some(user) = &proxy.user {
            push("--http.proxy.user", user.clone());
        }
        if let Some(password) = &proxy.password {
            push("--http.proxy.password", password.clone());
        }
        if let Some(scheme) = &proxy.scheme {
            let scheme: ProxyScheme = scheme.parse()?;
            push("--http.proxy.scheme", scheme.as_str().to_string());
        }
    }

    if config.auth.is_some() {
        let auth = format_auth(config.auth.as_ref())?;
        push("--auth", auth.text);
    }

    if let Some(format) = config.output()? {
        push("--output", format.as_str().to_string());
    }

    Ok(flags)
}
