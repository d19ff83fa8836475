//! Error types for portico-client.
//!
//! Every failure a caller sees is decided once, at the transport boundary:
//! a business failure reported by the internal envelope, an HTTP status
//! failure, or a transport failure with no HTTP status at all. The
//! `Display` output of those kinds is the human-readable message that was
//! also handed to the notifier.

use std::time::Duration;

/// Result type alias for portico-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// User-facing messages attached to classified failures.
pub mod messages {
    /// Envelope failure without a message of its own.
    pub const REQUEST_FAILED: &str = "request failed";
    /// HTTP 400 without a server-provided message.
    pub const BAD_REQUEST: &str = "bad request parameters";
    /// HTTP 401.
    pub const SESSION_EXPIRED: &str = "session expired";
    /// HTTP 403.
    pub const FORBIDDEN: &str = "forbidden";
    /// HTTP 404.
    pub const NOT_FOUND: &str = "resource not found";
    /// HTTP 500.
    pub const INTERNAL_SERVER_ERROR: &str = "internal server error";
    /// HTTP 502.
    pub const BAD_GATEWAY: &str = "gateway error";
    /// HTTP 503.
    pub const SERVICE_UNAVAILABLE: &str = "service unavailable";
    /// No response before the timeout elapsed.
    pub const TIMED_OUT: &str = "request timed out";
    /// Connection could not be established.
    pub const NETWORK: &str = "network error, check connection";
    /// Any other transport failure.
    pub const TRANSPORT: &str = "network error, please try again later";
}

/// Error type for portico-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// The human-readable message for this failure.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Business code reported by the internal envelope.
    pub fn business_code(&self) -> Option<i64> {
        match &self.kind {
            ErrorKind::Business { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the internal API reported a non-zero envelope code.
    pub fn is_business(&self) -> bool {
        matches!(self.kind, ErrorKind::Business { .. })
    }

    /// Returns true if no HTTP response was received.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Timeout { .. } | ErrorKind::Network(_) | ErrorKind::Transport(_)
        )
    }

    /// Returns true for HTTP 401.
    pub fn is_auth_error(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns true if this error is worth retrying under a transport-only policy.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The internal API answered with a non-zero envelope code.
    #[error("{message}")]
    Business { code: i64, message: String },

    /// The internal API answered with a body that is not an envelope.
    #[error("{}", messages::REQUEST_FAILED)]
    InvalidEnvelope(String),

    /// Non-2xx HTTP status; `message` is already classified.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// No response before the timeout elapsed.
    #[error("{}", messages::TIMED_OUT)]
    Timeout { after: Option<Duration> },

    /// Connection could not be established.
    #[error("{}", messages::NETWORK)]
    Network(String),

    /// Any other failure while talking to the server.
    #[error("{}", messages::TRANSPORT)]
    Transport(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid URL or path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The token store could not be read or written.
    #[error("Token store error: {0}")]
    TokenStore(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// Returns true if this error kind is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::Timeout { .. } => true,
            ErrorKind::Network(_) => true,
            ErrorKind::Transport(_) => true,
            ErrorKind::Http { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is typically retryable.
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout { after: None }
        } else if err.is_connect() {
            ErrorKind::Network(err.to_string())
        } else if err.is_builder() {
            ErrorKind::InvalidUrl(err.to_string())
        } else {
            ErrorKind::Transport(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidUrl(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}
