//! Ordered request/response middleware.
//!
//! Every call runs the chain in three stages:
//!
//! 1. `on_request` on each layer in order; the request is then sent.
//! 2. `on_response` on each layer in order for a 2xx response.
//! 3. `on_error` when something failed. If layer *i* fails in `on_response`,
//!    layers *i + 1..* observe the error. A failure before or during transport,
//!    or a non-2xx status, is observed by every layer.
//!
//! `on_error` cannot recover: the error always reaches the caller.
//!
//! The client installs its built-in layers first, in this order:
//! [`LoadingSignal`], [`BearerAuth`], [`EnvelopeUnwrap`], [`SessionExpiry`],
//! [`ErrorReporter`]. Custom layers run after them.

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::envelope;
use crate::error::{Error, Result};
use crate::notify::{LoadingEvent, Notifier};
use crate::request::{PreparedRequest, RequestContext, ResponseKind};
use crate::response::Response;
use crate::token::{TokenStore, REFRESH_TOKEN_KEY, TOKEN_KEY};

/// A stage hook around every call made by a client.
pub trait Middleware: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect or rewrite the outgoing request.
    fn on_request(&self, _ctx: &RequestContext, _request: &mut PreparedRequest) -> Result<()> {
        Ok(())
    }

    /// Inspect or rewrite a 2xx response.
    fn on_response(&self, _ctx: &RequestContext, _response: &mut Response) -> Result<()> {
        Ok(())
    }

    /// Observe a failure.
    fn on_error(&self, _ctx: &RequestContext, _error: &Error) {}
}

/// The layers of one client instance.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer.
    pub fn push(&mut self, layer: Arc<dyn Middleware>) {
        self.layers.push(layer);
    }

    /// Layer names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.name()).collect()
    }

    /// Run the request stage. On failure every layer observes the error.
    pub fn begin(&self, ctx: &RequestContext, request: &mut PreparedRequest) -> Result<()> {
        for layer in &self.layers {
            if let Err(err) = layer.on_request(ctx, request) {
                self.reject(ctx, &err);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Run the success stage. A failing layer hands the error to the layers after it.
    pub fn complete(&self, ctx: &RequestContext, response: &mut Response) -> Result<()> {
        for (i, layer) in self.layers.iter().enumerate() {
            if let Err(err) = layer.on_response(ctx, response) {
                for later in &self.layers[i + 1..] {
                    later.on_error(ctx, &err);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Let every layer observe a failure.
    pub fn reject(&self, ctx: &RequestContext, error: &Error) {
        for layer in &self.layers {
            layer.on_error(ctx, error);
        }
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Emits loading start/finish through the notifier.
pub struct LoadingSignal {
    notifier: Arc<dyn Notifier>,
}

impl LoadingSignal {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    fn finish(&self, ctx: &RequestContext) {
        if ctx.show_loading {
            self.notifier.loading(LoadingEvent::Finished { api: ctx.api });
        }
    }
}

impl Middleware for LoadingSignal {
    fn name(&self) -> &'static str {
        "loading"
    }

    fn on_request(&self, ctx: &RequestContext, _request: &mut PreparedRequest) -> Result<()> {
        if ctx.show_loading {
            self.notifier.loading(LoadingEvent::Started { api: ctx.api });
        }
        Ok(())
    }

    fn on_response(&self, ctx: &RequestContext, _response: &mut Response) -> Result<()> {
        self.finish(ctx);
        Ok(())
    }

    fn on_error(&self, ctx: &RequestContext, _error: &Error) {
        self.finish(ctx);
    }
}

/// Attaches `Authorization: Bearer <token>` when a token is stored.
pub struct BearerAuth {
    store: Arc<dyn TokenStore>,
}

impl BearerAuth {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

impl Middleware for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn on_request(&self, _ctx: &RequestContext, request: &mut PreparedRequest) -> Result<()> {
        if let Some(token) = self.store.get(TOKEN_KEY)? {
            if !token.is_empty() {
                request.set_header("authorization", format!("Bearer {token}"));
            }
        }
        Ok(())
    }
}

/// Replaces an internal JSON body with the envelope's `data`, or fails with
/// the business error it carries.
#[derive(Debug, Default)]
pub struct EnvelopeUnwrap;

impl Middleware for EnvelopeUnwrap {
    fn name(&self) -> &'static str {
        "envelope"
    }

    fn on_response(&self, ctx: &RequestContext, response: &mut Response) -> Result<()> {
        if !ctx.api.is_internal() || ctx.response_kind != ResponseKind::Json {
            return Ok(());
        }

        let data = envelope::unwrap(response.bytes())?;
        response.set_body(serde_json::to_vec(&data)?);
        Ok(())
    }
}

/// Clears stored tokens when the internal API answers 401.
pub struct SessionExpiry {
    store: Arc<dyn TokenStore>,
}

impl SessionExpiry {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

impl Middleware for SessionExpiry {
    fn name(&self) -> &'static str {
        "session-expiry"
    }

    fn on_error(&self, ctx: &RequestContext, error: &Error) {
        if !ctx.api.is_internal() || !error.is_auth_error() {
            return;
        }

        for key in [TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(err) = self.store.remove(key) {
                warn!(key, error = %err, "Failed to clear stored token");
            }
        }
        info!(url = %ctx.url, "Session expired, stored tokens cleared");
    }
}

/// Hands failure messages to the notifier unless the call opted out.
pub struct ErrorReporter {
    notifier: Arc<dyn Notifier>,
}

impl ErrorReporter {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl Middleware for ErrorReporter {
    fn name(&self) -> &'static str {
        "error-reporter"
    }

    fn on_error(&self, ctx: &RequestContext, error: &Error) {
        if ctx.show_error {
            self.notifier.error(&error.message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKind;
    use crate::error::{messages, ErrorKind};
    use crate::request::{RequestBody, RequestMethod};
    use crate::token::MemoryTokenStore;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Notifier for Recorder {
        fn success(&self, text: &str) {
            self.events.lock().unwrap().push(format!("success:{text}"));
        }
        fn error(&self, text: &str) {
            self.events.lock().unwrap().push(format!("error:{text}"));
        }
        fn warning(&self, text: &str) {
            self.events.lock().unwrap().push(format!("warning:{text}"));
        }
        fn info(&self, text: &str) {
            self.events.lock().unwrap().push(format!("info:{text}"));
        }
        fn loading(&self, event: LoadingEvent) {
            let label = match event {
                LoadingEvent::Started { .. } => "loading:start",
                LoadingEvent::Finished { .. } => "loading:finish",
            };
            self.events.lock().unwrap().push(label.to_string());
        }
    }

    struct Tagger {
        tag: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
        fail_response: bool,
    }

    impl Middleware for Tagger {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn on_request(&self, _ctx: &RequestContext, _request: &mut PreparedRequest) -> Result<()> {
            self.seen.lock().unwrap().push(format!("{}:request", self.tag));
            Ok(())
        }

        fn on_response(&self, _ctx: &RequestContext, _response: &mut Response) -> Result<()> {
            self.seen.lock().unwrap().push(format!("{}:response", self.tag));
            if self.fail_response {
                return Err(Error::new(ErrorKind::Other("boom".into())));
            }
            Ok(())
        }

        fn on_error(&self, _ctx: &RequestContext, _error: &Error) {
            self.seen.lock().unwrap().push(format!("{}:error", self.tag));
        }
    }

    fn ctx(api: ApiKind) -> RequestContext {
        RequestContext {
            api,
            method: RequestMethod::Get,
            url: "http://localhost/api/x".to_string(),
            show_loading: true,
            show_error: true,
            response_kind: ResponseKind::Json,
        }
    }

    fn request() -> PreparedRequest {
        PreparedRequest {
            method: RequestMethod::Get,
            url: "http://localhost/api/x".to_string(),
            headers: HashMap::new(),
            body: RequestBody::Empty,
            timeout: Duration::from_secs(1),
            on_progress: None,
        }
    }

    fn response(body: &'static str) -> Response {
        Response::new(200, HeaderMap::new(), Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn test_chain_order_and_failure_propagation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        for (tag, fail_response) in [("a", false), ("b", true), ("c", false)] {
            chain.push(Arc::new(Tagger {
                tag,
                seen: seen.clone(),
                fail_response,
            }));
        }

        let ctx = ctx(ApiKind::External);
        chain.begin(&ctx, &mut request()).unwrap();
        let err = chain.complete(&ctx, &mut response("{}")).unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "a:request", "b:request", "c:request", "a:response", "b:response", "c:error",
            ]
        );
    }

    #[test]
    fn test_bearer_attached_only_when_token_present() {
        let store = Arc::new(MemoryTokenStore::new());
        let layer = BearerAuth::new(store.clone());

        let mut req = request();
        layer.on_request(&ctx(ApiKind::Internal), &mut req).unwrap();
        assert_eq!(req.header("authorization"), None);

        store.set(TOKEN_KEY, "abc").unwrap();
        let mut req = request();
        layer.on_request(&ctx(ApiKind::External), &mut req).unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer abc"));
    }

    #[test]
    fn test_envelope_only_applies_to_internal_json() {
        let body = r#"{"code":0,"message":"ok","data":{"id":1}}"#;

        let mut internal = response(body);
        EnvelopeUnwrap
            .on_response(&ctx(ApiKind::Internal), &mut internal)
            .unwrap();
        assert_eq!(internal.bytes().as_ref(), br#"{"id":1}"#);

        let mut external = response(body);
        EnvelopeUnwrap
            .on_response(&ctx(ApiKind::External), &mut external)
            .unwrap();
        assert_eq!(external.bytes().as_ref(), body.as_bytes());

        let mut binary_ctx = ctx(ApiKind::Internal);
        binary_ctx.response_kind = ResponseKind::Binary;
        let mut binary = response("raw bytes");
        EnvelopeUnwrap.on_response(&binary_ctx, &mut binary).unwrap();
        assert_eq!(binary.bytes().as_ref(), b"raw bytes");
    }

    #[test]
    fn test_session_expiry_clears_internal_tokens_only() {
        let unauthorized = Error::new(ErrorKind::Http {
            status: 401,
            message: messages::SESSION_EXPIRED.into(),
        });

        let store = Arc::new(MemoryTokenStore::new());
        store.set(TOKEN_KEY, "t").unwrap();
        store.set(REFRESH_TOKEN_KEY, "r").unwrap();
        let layer = SessionExpiry::new(store.clone());

        layer.on_error(&ctx(ApiKind::External), &unauthorized);
        assert!(store.get(TOKEN_KEY).unwrap().is_some());

        layer.on_error(&ctx(ApiKind::Internal), &unauthorized);
        assert!(store.get(TOKEN_KEY).unwrap().is_none());
        assert!(store.get(REFRESH_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_loading_and_error_reporting() {
        let recorder = Arc::new(Recorder::default());
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(LoadingSignal::new(recorder.clone())));
        chain.push(Arc::new(EnvelopeUnwrap));
        chain.push(Arc::new(ErrorReporter::new(recorder.clone())));

        let ctx = ctx(ApiKind::Internal);
        chain.begin(&ctx, &mut request()).unwrap();
        let err = chain
            .complete(&ctx, &mut response(r#"{"code":7,"message":"quota exceeded"}"#))
            .unwrap_err();

        assert_eq!(err.business_code(), Some(7));
        assert_eq!(
            recorder.events(),
            vec!["loading:start", "loading:finish", "error:quota exceeded"]
        );
    }

    #[test]
    fn test_silent_context_emits_nothing() {
        let recorder = Arc::new(Recorder::default());
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(LoadingSignal::new(recorder.clone())));
        chain.push(Arc::new(ErrorReporter::new(recorder.clone())));

        let mut ctx = ctx(ApiKind::External);
        ctx.show_loading = false;
        ctx.show_error = false;
        chain.begin(&ctx, &mut request()).unwrap();
        chain.reject(&ctx, &Error::new(ErrorKind::Timeout { after: None }));

        assert!(recorder.events().is_empty());
    }
}
