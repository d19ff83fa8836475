//! Outbound request representation seen by the middleware chain.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use crate::config::ApiKind;
use crate::upload::{MultipartForm, ProgressCallback};

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_reqwest().as_str())
    }
}

/// What the caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// A JSON document; internal responses are envelopes.
    Json,
    /// Raw bytes, never envelope-decoded.
    Binary,
}

/// Request body content.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Bytes(Bytes),
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Returns true for multipart bodies, whose content type is owned by the transport.
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }
}

/// Read-only facts about a call, shared by every middleware layer.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Backend class of the issuing instance.
    pub api: ApiKind,
    /// HTTP method.
    pub method: RequestMethod,
    /// Fully resolved URL including query parameters.
    pub url: String,
    /// Whether loading signals are emitted for this call.
    pub show_loading: bool,
    /// Whether failures are reported through the notifier for this call.
    pub show_error: bool,
    /// Expected response shape.
    pub response_kind: ResponseKind,
}

/// A request about to be sent. Middleware may rewrite headers and body.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: RequestMethod,
    pub url: String,
    /// Header map with lowercase names.
    pub headers: HashMap<String, String>,
    pub body: RequestBody,
    pub timeout: Duration,
    pub(crate) on_progress: Option<ProgressCallback>,
}

impl PreparedRequest {
    /// Set a header, replacing any value under the same (case-insensitive) name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Get a header value.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PreparedRequest {
        PreparedRequest {
            method: RequestMethod::Get,
            url: "https://example.com/api".to_string(),
            headers: HashMap::new(),
            body: RequestBody::Empty,
            timeout: Duration::from_secs(1),
            on_progress: None,
        }
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(RequestMethod::Patch.to_reqwest(), reqwest::Method::PATCH);
        assert_eq!(RequestMethod::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let mut req = request();
        req.set_header("Authorization", "Bearer a");
        req.set_header("authorization", "Bearer b");

        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer b"));
    }

    #[test]
    fn test_multipart_detection() {
        assert!(RequestBody::Multipart(MultipartForm::new()).is_multipart());
        assert!(!RequestBody::Json(serde_json::json!({})).is_multipart());
    }
}
