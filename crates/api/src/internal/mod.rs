//! Services on the internal API.
//!
//! Every call goes through the internal client, so payloads arrive already
//! unwrapped from the envelope and failures are already reported.

use portico_auth::Session;
use portico_client::{ApiClients, HttpClient};

use crate::error::{Error, ErrorKind, Result};

mod common;
mod files;
mod user;

/// Typed access to the internal API.
///
/// # Example
///
/// ```rust,ignore
/// use portico_api::{InternalApi, LoginRequest};
///
/// let api = InternalApi::new(&clients);
/// let login = api.login(&LoginRequest::new("ada@example.com", "secret")).await?;
/// let me = api.profile().await?;
/// api.logout().await?;
/// ```
#[derive(Debug, Clone)]
pub struct InternalApi {
    client: HttpClient,
    session: Session,
}

impl InternalApi {
    /// Use the internal client of `clients` and its shared token store.
    pub fn new(clients: &ApiClients) -> Self {
        Self {
            client: clients.internal().clone(),
            session: Session::new(clients.token_store().clone()),
        }
    }

    /// Wrap an existing internal client.
    pub fn from_client(client: HttpClient) -> Result<Self> {
        if !client.api().is_internal() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "InternalApi needs an internal client".to_string(),
            )));
        }
        let session = Session::new(client.token_store().clone());
        Ok(Self { client, session })
    }

    /// Get the underlying client.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Get the session backed by the client's token store.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// Percent-encode one caller-supplied path segment.
pub(crate) fn segment(name: &str, value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::new(ErrorKind::InvalidInput(format!(
            "{name} must not be empty"
        ))));
    }
    Ok(urlencoding::encode(value).into_owned())
}
