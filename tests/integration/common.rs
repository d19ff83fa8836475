//! Shared setup: both clients against one mock server, tokens on disk.

use std::sync::Arc;
use std::time::Duration;

use portico_auth::FileTokenStore;
use portico_client::{ApiClients, ApiKind, ClientConfig, RetryConfig, SilentNotifier};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{MockServer, ResponseTemplate};

pub struct TestEnv {
    pub server: MockServer,
    pub clients: ApiClients,
    pub store: Arc<FileTokenStore>,
    // Keeps the token directory alive for the test.
    _dir: TempDir,
}

pub async fn env() -> TestEnv {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("temp dir");
    let store = Arc::new(FileTokenStore::with_path(dir.path().join("tokens")));

    let retry = RetryConfig::default().with_delay(Duration::from_millis(1));
    let internal = ClientConfig::builder()
        .with_base_url(format!("{}/api", server.uri()))
        .with_retry(retry.clone())
        .build();
    let external = ClientConfig::builder()
        .with_api(ApiKind::External)
        .with_retry(retry)
        .build();

    let clients = ApiClients::new(internal, external, store.clone(), Arc::new(SilentNotifier))
        .expect("clients should build");

    TestEnv {
        server,
        clients,
        store,
        _dir: dir,
    }
}

pub fn envelope(code: i64, message: &str, data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": code,
        "message": message,
        "data": data,
    }))
}

pub fn user(id: u64) -> Value {
    json!({
        "id": id,
        "name": "Grace",
        "email": "grace@example.com",
        "role": "user",
        "createdAt": "2024-03-01T09:00:00Z",
        "updatedAt": "2024-03-01T09:00:00Z",
    })
}
