//! Side-channel for user-facing messages and loading state.

use tracing::{debug, error, info, warn};

use crate::config::ApiKind;

/// Loading state transitions around a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingEvent {
    /// A call has been issued.
    Started { api: ApiKind },
    /// A call has completed, successfully or not.
    Finished { api: ApiKind },
}

/// Receives messages meant for the user. Implementations must not block.
pub trait Notifier: Send + Sync {
    /// A success message.
    fn success(&self, text: &str);

    /// An error message.
    fn error(&self, text: &str);

    /// A warning message.
    fn warning(&self, text: &str);

    /// An informational message.
    fn info(&self, text: &str);

    /// Loading state changes. Logged at debug level by default.
    fn loading(&self, event: LoadingEvent) {
        match event {
            LoadingEvent::Started { api } => debug!(%api, "Loading started"),
            LoadingEvent::Finished { api } => debug!(%api, "Loading finished"),
        }
    }
}

/// Notifier that writes every message to the tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, text: &str) {
        info!(target: "portico::notify", "{text}");
    }

    fn error(&self, text: &str) {
        error!(target: "portico::notify", "{text}");
    }

    fn warning(&self, text: &str) {
        warn!(target: "portico::notify", "{text}");
    }

    fn info(&self, text: &str) {
        info!(target: "portico::notify", "{text}");
    }
}

/// Notifier that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn success(&self, _text: &str) {}
    fn error(&self, _text: &str) {}
    fn warning(&self, _text: &str) {}
    fn info(&self, _text: &str) {}
    fn loading(&self, _event: LoadingEvent) {}
}
