//! # portico
//!
//! An HTTP client facade with two faces: one for an internal API that wraps
//! every payload in a `{code, message, data}` envelope, and one for
//! third-party APIs whose bodies pass through untouched.
//!
//! ## Crates
//!
//! - **portico-client** - HTTP clients, middleware chain, envelope decoding, retry, upload/download
//! - **portico-auth** - Session tokens and a file-backed token store
//! - **portico-api** - Typed services: users, files, common data, third-party APIs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use portico::{ApiClients, MemoryTokenStore, TracingNotifier};
//! use portico::api::{InternalApi, LoginRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let clients = ApiClients::from_env(
//!         Arc::new(MemoryTokenStore::new()),
//!         Arc::new(TracingNotifier),
//!     )?;
//!
//!     let api = InternalApi::new(&clients);
//!     api.login(&LoginRequest::new("ada@example.com", "secret")).await?;
//!     println!("{:?}", api.profile().await?);
//!     Ok(())
//! }
//! ```

#[cfg(feature = "api")]
pub use portico_api as api;
#[cfg(feature = "auth")]
pub use portico_auth as auth;
#[cfg(feature = "client")]
pub use portico_client as client;

#[cfg(feature = "client")]
pub use portico_client::{
    ApiClients, ApiKind, ClientConfig, HttpClient, MemoryTokenStore, RequestOptions,
    TracingNotifier,
};
