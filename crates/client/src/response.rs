//! Buffered HTTP response and status classification.

use std::sync::LazyLock;

use bytes::Bytes;
use regex_lite::Regex;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

use crate::error::{messages, Error, ErrorKind, Result};

/// A fully read response, as seen by the middleware chain.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub(crate) fn new(status: u16, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// All response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// The current body. For internal JSON calls this is the envelope's `data`
    /// once the chain has run.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Take ownership of the body.
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| {
            Error::with_source(
                ErrorKind::Other("Failed to decode response as UTF-8".to_string()),
                e,
            )
        })
    }

    /// Deserialize the body as JSON. An empty body reads as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-2xx response into a classified error.
    pub fn error_for_status(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }
        Err(classify_status(self.status, &self.body))
    }
}

/// Map a failed HTTP status to an error carrying the user-facing message.
pub fn classify_status(status: u16, body: &[u8]) -> Error {
    let message = match status {
        400 => server_message(body).unwrap_or_else(|| messages::BAD_REQUEST.to_string()),
        401 => messages::SESSION_EXPIRED.to_string(),
        403 => messages::FORBIDDEN.to_string(),
        404 => messages::NOT_FOUND.to_string(),
        500 => messages::INTERNAL_SERVER_ERROR.to_string(),
        502 => messages::BAD_GATEWAY.to_string(),
        503 => messages::SERVICE_UNAVAILABLE.to_string(),
        _ => server_message(body).unwrap_or_else(|| format!("request failed ({status})")),
    };

    Error::new(ErrorKind::Http { status, message })
}

/// The `message` field of a JSON error body, sanitized.
fn server_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let message = value.get("message")?.as_str()?.trim();
    if message.is_empty() {
        return None;
    }
    Some(sanitize_error_message(message))
}

static BEARER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)bearer\s+[A-Za-z0-9\-._~+/]+=*").ok());

static JWT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"eyJ[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]{8,}\.[A-Za-z0-9_-]+").ok()
});

/// Strip credentials from a server-provided message and cap its length.
fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let mut sanitized = message.to_string();

    if let Some(pattern) = BEARER_PATTERN.as_ref() {
        sanitized = pattern
            .replace_all(&sanitized, "Bearer [REDACTED]")
            .into_owned();
    }

    if let Some(pattern) = JWT_PATTERN.as_ref() {
        sanitized = pattern
            .replace_all(&sanitized, "[REDACTED_TOKEN]")
            .into_owned();
    }

    if sanitized.len() > MAX_LENGTH {
        let cut = (0..=MAX_LENGTH)
            .rev()
            .find(|&i| sanitized.is_char_boundary(i))
            .unwrap_or(0);
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
