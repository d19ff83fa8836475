//! Error types for portico-auth.
//!
//! Error messages never include token values.

/// Result type alias for portico-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for portico-auth operations.
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
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The token store rejected a read or write.
    #[error("Token store error: {0}")]
    Store(String),

    /// Stored data could not be decoded.
    #[error("Corrupt token file: {0}")]
    Corrupt(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<portico_client::Error> for Error {
    fn from(err: portico_client::Error) -> Self {
        Error::with_source(ErrorKind::Store(err.to_string()), err)
    }
}

/// Lets a store backed by this crate report through the client's
/// `TokenStore` interface.
impl From<Error> for portico_client::Error {
    fn from(err: Error) -> Self {
        portico_client::Error::with_source(
            portico_client::ErrorKind::TokenStore(err.to_string()),
            err,
        )
    }
}
