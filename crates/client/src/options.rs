//! Per-call request options and query parameters.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::Result;

/// Per-call overrides, merged over the instance defaults.
///
/// Unset fields fall back to the instance configuration; set fields win.
///
/// ```rust
/// use portico_client::RequestOptions;
/// use std::time::Duration;
///
/// let options = RequestOptions::new()
///     .show_error(false)
///     .timeout(Duration::from_secs(5))
///     .header("X-Request-Id", "abc");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub(crate) show_loading: Option<bool>,
    pub(crate) show_error: Option<bool>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) retries: Option<u32>,
    pub(crate) headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Options that change nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit or suppress loading signals for this call.
    pub fn show_loading(mut self, enabled: bool) -> Self {
        self.show_loading = Some(enabled);
        self
    }

    /// Report or suppress failure notifications for this call.
    pub fn show_error(mut self, enabled: bool) -> Self {
        self.show_error = Some(enabled);
        self
    }

    /// Suppress both loading signals and failure notifications.
    pub fn silent(self) -> Self {
        self.show_loading(false).show_error(false)
    }

    /// Override the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Retry this call up to `retries` more times on failure.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Add a header for this call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Options after merging a call's overrides over the instance defaults.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedOptions {
    pub show_loading: bool,
    pub show_error: bool,
    pub timeout: Duration,
    pub retries: u32,
    pub headers: HashMap<String, String>,
}

impl ResolvedOptions {
    pub fn resolve(config: &ClientConfig, options: Option<&RequestOptions>) -> Self {
        let mut resolved = Self {
            show_loading: config.show_loading,
            show_error: config.show_error,
            timeout: config.timeout,
            retries: 0,
            headers: config
                .default_headers
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
                .collect(),
        };

        if let Some(options) = options {
            if let Some(show_loading) = options.show_loading {
                resolved.show_loading = show_loading;
            }
            if let Some(show_error) = options.show_error {
                resolved.show_error = show_error;
            }
            if let Some(timeout) = options.timeout {
                resolved.timeout = timeout;
            }
            if let Some(retries) = options.retries {
                resolved.retries = retries;
            }
            for (name, value) in &options.headers {
                resolved
                    .headers
                    .insert(name.to_ascii_lowercase(), value.clone());
            }
        }

        resolved
    }
}

/// Ordered query parameters appended to the request URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// No parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter.
    pub fn insert(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((name.into(), value.to_string()));
        self
    }

    /// Append a parameter only when `value` is present.
    pub fn insert_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.insert(name, value),
            None => self,
        }
    }

    /// Build parameters from any value that serializes as a flat map.
    ///
    /// `None` fields are skipped.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let encoded = serde_urlencoded::to_string(value)?;
        let pairs = url::form_urlencoded::parse(encoded.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Ok(Self { pairs })
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterate over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString, const N: usize> From<[(K, V); N]> for Params {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .fold(Params::new(), |params, (k, v)| params.insert(k, v))
    }
}
