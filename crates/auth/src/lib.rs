//! # portico-auth
//!
//! Token persistence and login session handling for portico clients.
//!
//! - [`FileTokenStore`] keeps `token` / `refreshToken` on disk so a session
//!   survives restarts.
//! - [`Session`] writes tokens after login and clears them on logout, over
//!   any [`TokenStore`](portico_client::TokenStore).
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use portico_auth::{AuthTokens, FileTokenStore, Session};
//!
//! let store = Arc::new(FileTokenStore::new()?);
//! let session = Session::new(store.clone());
//! session.establish(&AuthTokens::new("access").with_refresh_token("refresh"))?;
//! assert!(session.is_authenticated()?);
//! ```

mod error;
mod session;
mod storage;

pub use error::{Error, ErrorKind, Result};
pub use session::{AuthTokens, Session};
pub use storage::{default_token_dir, FileTokenStore};
