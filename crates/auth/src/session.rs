//! Login session state kept in the shared token store.
//!
//! The HTTP client only reads the access token and clears both keys on 401;
//! writing them is the session's job.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use portico_client::{TokenStore, REFRESH_TOKEN_KEY, TOKEN_KEY};

use crate::error::{Error, ErrorKind, Result};

/// Tokens issued by a successful login.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    #[serde(rename = "token")]
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

impl fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Reads and writes the login tokens.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn TokenStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Store the tokens from a login. A missing refresh token removes any
    /// previously stored one.
    #[instrument(skip_all)]
    pub fn establish(&self, tokens: &AuthTokens) -> Result<()> {
        if tokens.access_token.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "empty access token".to_string(),
            )));
        }

        self.store.set(TOKEN_KEY, &tokens.access_token)?;
        match &tokens.refresh_token {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh)?,
            None => self.store.remove(REFRESH_TOKEN_KEY)?,
        }

        info!(has_refresh = tokens.refresh_token.is_some(), "Session established");
        Ok(())
    }

    /// Remove both tokens.
    #[instrument(skip_all)]
    pub fn clear(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        info!("Session cleared");
        Ok(())
    }

    pub fn access_token(&self) -> Result<Option<String>> {
        Ok(self.store.get(TOKEN_KEY)?)
    }

    pub fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.store.get(REFRESH_TOKEN_KEY)?)
    }

    /// Returns true if a non-empty access token is stored.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self
            .access_token()?
            .is_some_and(|token| !token.is_empty()))
    }

    /// Replace the access token after a refresh, keeping the refresh token.
    pub fn update_access_token(&self, access_token: &str) -> Result<()> {
        if access_token.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "empty access token".to_string(),
            )));
        }
        self.store.set(TOKEN_KEY, access_token)?;
        Ok(())
    }
}
