//! Client configuration.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};
use crate::retry::RetryConfig;

/// Environment variable holding the internal API base URL.
pub const ENV_API_BASE_URL: &str = "PORTICO_API_BASE_URL";
/// Environment variable holding the request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "PORTICO_TIMEOUT_MS";
/// Environment variable toggling error notifications.
pub const ENV_SHOW_ERRORS: &str = "PORTICO_SHOW_ERRORS";

/// Base URL used when `PORTICO_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Which class of backend a client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKind {
    /// Backend under our control, answering with `{code, message, data}` envelopes.
    Internal,
    /// Third-party backend whose responses are passed through untouched.
    External,
}

impl ApiKind {
    /// Returns true for the internal API.
    pub fn is_internal(&self) -> bool {
        matches!(self, ApiKind::Internal)
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKind::Internal => f.write_str("Internal"),
            ApiKind::External => f.write_str("External"),
        }
    }
}

/// Configuration for one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend class this instance talks to.
    pub api: ApiKind,
    /// Base URL prepended to relative paths.
    pub base_url: Option<String>,
    /// Default request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Pool idle timeout.
    pub pool_idle_timeout: Duration,
    /// Idle pooled connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Sent as `User-Agent` on every request.
    pub user_agent: String,
    /// Headers sent with every request. Keys are lowercase.
    pub default_headers: HashMap<String, String>,
    /// Emit loading signals unless a call opts out.
    pub show_loading: bool,
    /// Report failures through the notifier unless a call opts out.
    pub show_error: bool,
    /// Retry settings for `retries` per-call options and the retry helper.
    pub retry: RetryConfig,
    /// Accept gzip/deflate encoded responses.
    pub compression: bool,
    /// Emit request/response tracing events.
    pub enable_tracing: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            api: ApiKind::Internal,
            base_url: None,
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: crate::USER_AGENT.to_string(),
            default_headers,
            show_loading: true,
            show_error: true,
            retry: RetryConfig::default(),
            compression: true,
            enable_tracing: true,
        }
    }
}

impl ClientConfig {
    /// Start from the internal defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults for the internal API rooted at `base_url`.
    pub fn internal(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiKind::Internal,
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Defaults for third-party APIs, which are addressed with absolute URLs.
    pub fn external() -> Self {
        Self {
            api: ApiKind::External,
            base_url: None,
            ..Default::default()
        }
    }

    /// Internal API configuration from the environment.
    ///
    /// Reads `PORTICO_API_BASE_URL`, `PORTICO_TIMEOUT_MS` and
    /// `PORTICO_SHOW_ERRORS`; unset variables keep their defaults.
    pub fn internal_from_env() -> Result<Self> {
        let base_url = std::env::var(ENV_API_BASE_URL)
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        Self::internal(base_url).apply_env()
    }

    /// External API configuration from the environment.
    pub fn external_from_env() -> Result<Self> {
        Self::external().apply_env()
    }

    fn apply_env(mut self) -> Result<Self> {
        if let Ok(raw) = std::env::var(ENV_TIMEOUT_MS) {
            let millis = raw.trim().parse::<u64>().map_err(|e| {
                Error::with_source(
                    ErrorKind::Config(format!("{ENV_TIMEOUT_MS} must be milliseconds, got {raw:?}")),
                    e,
                )
            })?;
            self.timeout = Duration::from_millis(millis);
        }

        if let Ok(raw) = std::env::var(ENV_SHOW_ERRORS) {
            self.show_error = parse_flag(&raw).ok_or_else(|| {
                Error::new(ErrorKind::Config(format!(
                    "{ENV_SHOW_ERRORS} must be true or false, got {raw:?}"
                )))
            })?;
        }

        Ok(self)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Fluent construction of a [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the backend class.
    pub fn with_api(mut self, api: ApiKind) -> Self {
        self.config.api = api;
        self
    }

    /// Set the base URL prepended to relative paths.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Set the default request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Limit on establishing a connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Drop pooled connections idle for longer than this.
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Cap idle pooled connections per host.
    pub fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Override the User-Agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add or replace a default header.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.config
            .default_headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Remove a default header.
    pub fn without_header(mut self, name: impl AsRef<str>) -> Self {
        self.config
            .default_headers
            .remove(&name.as_ref().to_ascii_lowercase());
        self
    }

    /// Emit loading signals by default.
    pub fn with_show_loading(mut self, enabled: bool) -> Self {
        self.config.show_loading = enabled;
        self
    }

    /// Report failures through the notifier by default.
    pub fn with_show_error(mut self, enabled: bool) -> Self {
        self.config.show_error = enabled;
        self
    }

    /// Retry settings used by `retry` and per-call `retries`.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    /// Negotiate gzip/deflate with the server.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.compression = enabled;
        self
    }

    /// Toggle `debug!`/`info!` events for each request.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
