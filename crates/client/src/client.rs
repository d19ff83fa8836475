//! The client instance: one pooled transport, one middleware chain.
//!
//! Tokens and notifier handles are redacted from Debug output; request
//! bodies and headers are skipped in tracing spans.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{ApiKind, ClientConfig};
use crate::download::Download;
use crate::error::{Error, ErrorKind, Result};
use crate::middleware::{
    BearerAuth, EnvelopeUnwrap, ErrorReporter, LoadingSignal, Middleware, MiddlewareChain,
    SessionExpiry,
};
use crate::notify::{Notifier, TracingNotifier};
use crate::options::{Params, RequestOptions, ResolvedOptions};
use crate::request::{PreparedRequest, RequestBody, RequestContext, RequestMethod, ResponseKind};
use crate::response::Response;
use crate::retry::{self, RetryConfig};
use crate::token::{MemoryTokenStore, TokenStore};
use crate::upload::{ProgressCallback, UploadSource};

/// HTTP client for one class of backend.
///
/// Cheap to clone: clones share the connection pool, token store, notifier
/// and middleware chain. Build it once and reuse it.
///
/// # Example
///
/// ```rust,ignore
/// use portico_client::{ClientConfig, HttpClient, Params};
///
/// let client = HttpClient::new(ClientConfig::internal("https://api.example.com"))?;
///
/// let profile: serde_json::Value = client.get("/users/profile", None, None).await?;
/// let page: serde_json::Value = client
///     .get("/users", Some(&Params::from([("page", "1")])), None)
///     .await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    token_store: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    chain: MiddlewareChain,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("api", &self.inner.config.api)
            .field("base_url", &self.inner.config.base_url)
            .field("token_store", &"[REDACTED]")
            .field("middleware", &self.inner.chain)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    config: ClientConfig,
    token_store: Option<Arc<dyn TokenStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl HttpClientBuilder {
    /// Share a token store. Defaults to a fresh [`MemoryTokenStore`].
    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Share a notifier. Defaults to [`TracingNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Append a layer after the built-in ones.
    pub fn middleware(mut self, layer: Arc<dyn Middleware>) -> Self {
        self.middleware.push(layer);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpClient> {
        let config = self.config;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.compression)
            .deflate(config.compression)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        let token_store = self
            .token_store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(LoadingSignal::new(notifier.clone())));
        chain.push(Arc::new(BearerAuth::new(token_store.clone())));
        chain.push(Arc::new(EnvelopeUnwrap));
        chain.push(Arc::new(SessionExpiry::new(token_store.clone())));
        chain.push(Arc::new(ErrorReporter::new(notifier.clone())));
        for layer in self.middleware {
            chain.push(layer);
        }

        debug!(api = %config.api, base_url = ?config.base_url, "HTTP client built");

        Ok(HttpClient {
            inner: Arc::new(ClientInner {
                http,
                config,
                token_store,
                notifier,
                chain,
            }),
        })
    }
}

/// What a single call sends and expects.
struct Call<'a> {
    method: RequestMethod,
    path: &'a str,
    params: Option<&'a Params>,
    body: RequestBody,
    response_kind: ResponseKind,
    on_progress: Option<ProgressCallback>,
}

impl<'a> Call<'a> {
    fn new(method: RequestMethod, path: &'a str) -> Self {
        Self {
            method,
            path,
            params: None,
            body: RequestBody::Empty,
            response_kind: ResponseKind::Json,
            on_progress: None,
        }
    }
}

impl HttpClient {
    /// Create a client with the default token store and notifier.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a client.
    pub fn builder(config: ClientConfig) -> HttpClientBuilder {
        HttpClientBuilder {
            config,
            token_store: None,
            notifier: None,
            middleware: Vec::new(),
        }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Backend class of this instance.
    pub fn api(&self) -> ApiKind {
        self.inner.config.api
    }

    /// The shared token store.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.token_store
    }

    /// The shared notifier.
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    /// Layer names in execution order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.inner.chain.names()
    }

    /// GET `path` with optional query parameters.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&Params>,
        options: Option<&RequestOptions>,
    ) -> Result<T> {
        let call = Call {
            params,
            ..Call::new(RequestMethod::Get, path)
        };
        self.request(call, options).await?.json()
    }

    /// POST a JSON body.
    pub async fn post<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(RequestMethod::Post, path, body, options).await
    }

    /// PUT a JSON body.
    pub async fn put<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(RequestMethod::Put, path, body, options).await
    }

    /// PATCH a JSON body.
    pub async fn patch<T, B>(
        &self,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(RequestMethod::Patch, path, body, options).await
    }

    /// DELETE `path`.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: Option<&RequestOptions>,
    ) -> Result<T> {
        self.request(Call::new(RequestMethod::Delete, path), options)
            .await?
            .json()
    }

    /// POST a multipart upload.
    ///
    /// A single [`UploadFile`](crate::UploadFile) is sent under the field
    /// `file`. The multipart content type with its boundary always replaces
    /// any configured `Content-Type`.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        source: impl Into<UploadSource>,
        options: Option<&RequestOptions>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<T> {
        let call = Call {
            body: RequestBody::Multipart(source.into().into_form()),
            on_progress,
            ..Call::new(RequestMethod::Post, path)
        };
        self.request(call, options).await?.json()
    }

    /// GET binary content. The body is never envelope-decoded.
    pub async fn download(
        &self,
        path: &str,
        params: Option<&Params>,
        file_name: Option<&str>,
        options: Option<&RequestOptions>,
    ) -> Result<Download> {
        let call = Call {
            params,
            response_kind: ResponseKind::Binary,
            ..Call::new(RequestMethod::Get, path)
        };
        let response = self.request(call, options).await?;
        Ok(Download::from_response(response, file_name))
    }

    /// GET `path` and keep status and headers alongside the body.
    pub async fn get_full_response(
        &self,
        path: &str,
        params: Option<&Params>,
        options: Option<&RequestOptions>,
    ) -> Result<Response> {
        let call = Call {
            params,
            ..Call::new(RequestMethod::Get, path)
        };
        self.request(call, options).await
    }

    /// Run `op` under this instance's retry configuration.
    pub async fn retry<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        run_with_retry(&self.inner.config.retry, op).await
    }

    /// Run `op` with an explicit retry count and base delay.
    pub async fn retry_with<T, F, Fut>(&self, op: F, max_retries: u32, delay: Duration) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let config = self
            .inner
            .config
            .retry
            .clone()
            .with_max_retries(max_retries)
            .with_delay(delay);
        run_with_retry(&config, op).await
    }

    /// Await a batch of calls concurrently, failing on the first error.
    pub async fn all<T, I>(calls: I) -> Result<Vec<T>>
    where
        I: IntoIterator,
        I::Item: Future<Output = Result<T>>,
    {
        futures::future::try_join_all(calls).await
    }

    async fn send_json<T, B>(
        &self,
        method: RequestMethod,
        path: &str,
        body: Option<&B>,
        options: Option<&RequestOptions>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = match body {
            Some(body) => RequestBody::Json(serde_json::to_value(body)?),
            None => RequestBody::Empty,
        };
        let call = Call {
            body,
            ..Call::new(method, path)
        };
        self.request(call, options).await?.json()
    }

    /// Resolve options and the URL, then execute with per-call retries.
    async fn request(&self, call: Call<'_>, options: Option<&RequestOptions>) -> Result<Response> {
        let resolved = ResolvedOptions::resolve(&self.inner.config, options);
        let ctx = RequestContext {
            api: self.inner.config.api,
            method: call.method,
            url: self.resolve_url(call.path, call.params)?,
            show_loading: resolved.show_loading,
            show_error: resolved.show_error,
            response_kind: call.response_kind,
        };

        if resolved.retries == 0 {
            return self.execute(&ctx, &call, &resolved).await;
        }

        let config = self
            .inner
            .config
            .retry
            .clone()
            .with_max_retries(resolved.retries);
        run_with_retry(&config, || self.execute(&ctx, &call, &resolved)).await
    }

    /// One attempt through the middleware chain.
    #[instrument(
        skip(self, ctx, call, resolved),
        fields(api = %ctx.api, method = %ctx.method, url = %ctx.url)
    )]
    async fn execute(
        &self,
        ctx: &RequestContext,
        call: &Call<'_>,
        resolved: &ResolvedOptions,
    ) -> Result<Response> {
        let chain = &self.inner.chain;

        let mut request = PreparedRequest {
            method: ctx.method,
            url: ctx.url.clone(),
            headers: resolved.headers.clone(),
            body: call.body.clone(),
            timeout: resolved.timeout,
            on_progress: call.on_progress.clone(),
        };
        chain.begin(ctx, &mut request)?;

        let mut response = match self
            .send(request)
            .await
            .and_then(Response::error_for_status)
        {
            Ok(response) => response,
            Err(err) => {
                chain.reject(ctx, &err);
                return Err(err);
            }
        };

        chain.complete(ctx, &mut response)?;
        Ok(response)
    }

    /// Put a prepared request on the wire and buffer the response.
    async fn send(&self, request: PreparedRequest) -> Result<Response> {
        let PreparedRequest {
            method,
            url,
            mut headers,
            body,
            timeout,
            on_progress,
        } = request;

        // The transport owns the content type of multipart and empty bodies.
        if matches!(body, RequestBody::Empty) || body.is_multipart() {
            headers.retain(|name, _| !name.eq_ignore_ascii_case("content-type"));
        }

        let mut req = self
            .inner
            .http
            .request(method.to_reqwest(), url.as_str())
            .timeout(timeout);

        for (name, value) in &headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                Error::with_source(ErrorKind::Config(format!("invalid header name {name:?}")), e)
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                Error::with_source(ErrorKind::Config(format!("invalid value for header {name}")), e)
            })?;
            req = req.header(name, value);
        }

        req = match body {
            RequestBody::Empty => req,
            RequestBody::Json(value) => req.json(&value),
            RequestBody::Bytes(bytes) => req.body(bytes),
            RequestBody::Multipart(form) => req.multipart(form.into_reqwest(on_progress.as_ref())?),
        };

        if self.inner.config.enable_tracing {
            debug!(%method, url = %url, "Sending request");
        }

        let response = req.send().await.map_err(|e| transport_error(e, timeout))?;
        let status = response.status().as_u16();
        let response_headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        if self.inner.config.enable_tracing {
            if (200..300).contains(&status) {
                debug!(status, content_length = body.len(), "Response received");
            } else {
                info!(status, content_length = body.len(), "Non-success response");
            }
        }

        Ok(Response::new(status, response_headers, body))
    }

    /// Build the request URL.
    ///
    /// Absolute `http(s)://` paths are used as-is; anything else is joined
    /// onto the base URL. Query parameters are appended in order.
    fn resolve_url(&self, path: &str, params: Option<&Params>) -> Result<String> {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            Url::parse(path)?
        } else {
            let base = self.inner.config.base_url.as_deref().ok_or_else(|| {
                Error::new(ErrorKind::InvalidUrl(format!(
                    "relative path {path:?} on an instance without a base URL"
                )))
            })?;
            Url::parse(&format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ))?
        };

        if let Some(params) = params.filter(|p| !p.is_empty()) {
            let mut query = url.query_pairs_mut();
            for (name, value) in params.iter() {
                query.append_pair(name, value);
            }
        }

        Ok(url.into())
    }
}

async fn run_with_retry<T, F, Fut>(config: &RetryConfig, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry::retry_when(config, op, |err: &Error| config.retry_on.allows(err)).await
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> Error {
    let mut error = Error::from(err);
    if let ErrorKind::Timeout { after } = &mut error.kind {
        *after = Some(timeout);
    }
    error
}
