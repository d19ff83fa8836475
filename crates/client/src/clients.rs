//! The internal/external client pair.

use std::sync::Arc;

use crate::client::HttpClient;
use crate::config::{ApiKind, ClientConfig};
use crate::error::{Error, ErrorKind, Result};
use crate::notify::Notifier;
use crate::token::TokenStore;

/// Exactly one client per backend class, sharing one token store and one
/// notifier. Build it at startup and hand clones to whoever needs them.
#[derive(Debug, Clone)]
pub struct ApiClients {
    internal: HttpClient,
    external: HttpClient,
}

impl ApiClients {
    /// Build both clients from explicit configurations.
    pub fn new(
        internal: ClientConfig,
        external: ClientConfig,
        token_store: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        expect_kind(&internal, ApiKind::Internal)?;
        expect_kind(&external, ApiKind::External)?;

        let internal = HttpClient::builder(internal)
            .token_store(token_store.clone())
            .notifier(notifier.clone())
            .build()?;
        let external = HttpClient::builder(external)
            .token_store(token_store)
            .notifier(notifier)
            .build()?;

        Ok(Self { internal, external })
    }

    /// Build both clients from `PORTICO_*` environment variables.
    pub fn from_env(token_store: Arc<dyn TokenStore>, notifier: Arc<dyn Notifier>) -> Result<Self> {
        Self::new(
            ClientConfig::internal_from_env()?,
            ClientConfig::external_from_env()?,
            token_store,
            notifier,
        )
    }

    /// Client for the envelope-style internal API.
    pub fn internal(&self) -> &HttpClient {
        &self.internal
    }

    /// Client for third-party APIs.
    pub fn external(&self) -> &HttpClient {
        &self.external
    }

    /// The token store both clients read.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        self.internal.token_store()
    }

    /// The notifier both clients report to.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        self.internal.notifier()
    }
}

fn expect_kind(config: &ClientConfig, kind: ApiKind) -> Result<()> {
    if config.api == kind {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Config(format!(
        "expected a {kind} client configuration, got {}",
        config.api
    ))))
}
