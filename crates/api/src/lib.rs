//! # portico-api
//!
//! Typed services over [`portico_client::ApiClients`]:
//!
//! - [`InternalApi`] for the envelope-style internal API (users, files,
//!   common data). Login and logout keep the shared session in sync.
//! - [`ThirdPartyApi`] for public APIs whose bodies are returned as-is.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use portico_api::{InternalApi, LoginRequest, ThirdPartyApi};
//! use portico_client::{ApiClients, MemoryTokenStore, TracingNotifier};
//!
//! let clients = ApiClients::from_env(Arc::new(MemoryTokenStore::new()), Arc::new(TracingNotifier))?;
//!
//! let api = InternalApi::new(&clients);
//! api.login(&LoginRequest::new("ada@example.com", "secret")).await?;
//! let users = api.list_users(&Default::default()).await?;
//!
//! let github = ThirdPartyApi::new(&clients);
//! let octocat = github.github_user("octocat").await?;
//! ```

mod error;
mod external;
mod internal;
mod types;

pub use error::{Error, ErrorKind, Result};
pub use external::{Endpoints, ThirdPartyApi, DEFAULT_BASE_CURRENCY};
pub use internal::InternalApi;
pub use types::{
    DictItem, DictValue, LoginRequest, LoginResponse, NewPost, PaginationResponse, ProfileUpdate,
    RegisterRequest, UploadedFile, User, UserListQuery, VerifyCodeType,
};
