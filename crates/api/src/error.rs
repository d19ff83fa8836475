//! Error types for portico-api.

/// Result type alias for portico-api operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for portico-api operations.
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

    /// The underlying client failure, if the call reached the client.
    pub fn client_error(&self) -> Option<&portico_client::Error> {
        match &self.kind {
            ErrorKind::Client(err) => Some(err),
            _ => None,
        }
    }

    /// Business code reported by the internal API.
    pub fn business_code(&self) -> Option<i64> {
        self.client_error().and_then(portico_client::Error::business_code)
    }

    /// HTTP status of a failed response.
    pub fn status(&self) -> Option<u16> {
        self.client_error().and_then(portico_client::Error::status)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The call failed in the HTTP client; already classified and reported.
    #[error(transparent)]
    Client(portico_client::Error),

    /// Reading or writing the session failed.
    #[error(transparent)]
    Session(portico_auth::Error),

    /// The operation needs a stored token and there is none.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<portico_client::Error> for Error {
    fn from(err: portico_client::Error) -> Self {
        Error::new(ErrorKind::Client(err))
    }
}

impl From<portico_auth::Error> for Error {
    fn from(err: portico_auth::Error) -> Self {
        Error::new(ErrorKind::Session(err))
    }
}
