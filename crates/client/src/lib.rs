//! # portico-client
//!
//! HTTP client facade for two classes of backend:
//!
//! - the **internal API**, which wraps every payload in a
//!   `{code, message, data}` envelope, and
//! - **third-party APIs**, whose responses are passed through untouched.
//!
//! Both instances share a token store and a notifier and run every call
//! through the same middleware chain:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        ApiClients                           │
//! │  - internal: HttpClient (envelope decoding, 401 clears)     │
//! │  - external: HttpClient (pass-through)                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MiddlewareChain                         │
//! │  loading → bearer-auth → envelope → session-expiry →        │
//! │  error-reporter → custom layers                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  reqwest (pooled transport)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use portico_client::{ApiClients, MemoryTokenStore, TracingNotifier};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portico_client::Error> {
//!     let clients = ApiClients::from_env(
//!         Arc::new(MemoryTokenStore::new()),
//!         Arc::new(TracingNotifier),
//!     )?;
//!
//!     // Envelope already unwrapped: this is `data`.
//!     let profile: serde_json::Value = clients
//!         .internal()
//!         .get("/users/profile", None, None)
//!         .await?;
//!
//!     // Third-party body as-is.
//!     let user: serde_json::Value = clients
//!         .external()
//!         .get("https://api.github.com/users/octocat", None, None)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod client;
mod clients;
mod config;
mod download;
pub mod envelope;
mod error;
pub mod middleware;
mod notify;
mod options;
mod request;
mod response;
pub mod retry;
mod token;
mod upload;

pub use client::{HttpClient, HttpClientBuilder};
pub use clients::ApiClients;
pub use config::{
    ApiKind, ClientConfig, ClientConfigBuilder, DEFAULT_API_BASE_URL, ENV_API_BASE_URL,
    ENV_SHOW_ERRORS, ENV_TIMEOUT_MS,
};
pub use download::{Download, DEFAULT_FILE_NAME};
pub use envelope::Envelope;
pub use error::{messages, Error, ErrorKind, Result};
pub use middleware::{Middleware, MiddlewareChain};
pub use notify::{LoadingEvent, Notifier, SilentNotifier, TracingNotifier};
pub use options::{Params, RequestOptions};
pub use request::{PreparedRequest, RequestBody, RequestContext, RequestMethod, ResponseKind};
pub use response::{classify_status, Response};
pub use retry::{BackoffStrategy, RetryConfig, RetryOn, RetryPolicy};
pub use token::{MemoryTokenStore, TokenStore, REFRESH_TOKEN_KEY, TOKEN_KEY};
pub use upload::{
    MultipartForm, ProgressCallback, UploadFile, UploadProgress, UploadSource, UPLOAD_FIELD_NAME,
};

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("portico/", env!("CARGO_PKG_VERSION"));
