//! Service flows against a mock server.

use std::sync::Arc;
use std::time::Duration;

use portico_api::{
    DictValue, Endpoints, ErrorKind, InternalApi, LoginRequest, NewPost, ThirdPartyApi,
    UserListQuery, VerifyCodeType,
};
use portico_client::{
    ApiClients, ApiKind, ClientConfig, MemoryTokenStore, RetryConfig, SilentNotifier, TokenStore,
    UploadFile, REFRESH_TOKEN_KEY, TOKEN_KEY,
};
use serde_json::{json, Value};
use wiremock::matchers::{
    body_json, body_string_contains, header, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    clients: ApiClients,
    store: Arc<MemoryTokenStore>,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryTokenStore::new());

    let fast_retry = RetryConfig::default().with_delay(Duration::from_millis(1));
    let internal = ClientConfig::builder()
        .with_base_url(format!("{}/api", server.uri()))
        .with_retry(fast_retry.clone())
        .build();
    let external = ClientConfig::builder()
        .with_api(ApiKind::External)
        .with_retry(fast_retry)
        .build();

    let clients = ApiClients::new(internal, external, store.clone(), Arc::new(SilentNotifier))
        .expect("clients should build");

    Harness {
        server,
        clients,
        store,
    }
}

fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "code": 0,
        "message": "success",
        "data": data,
    }))
}

fn user_json(id: u64) -> Value {
    json!({
        "id": id,
        "name": "Ada",
        "email": "ada@example.com",
        "role": "admin",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-02T00:00:00Z",
    })
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_login_stores_tokens() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "secret"})))
        .respond_with(ok(json!({
            "user": user_json(7),
            "token": "access-1",
            "refreshToken": "refresh-1",
            "expiresIn": 3600,
        })))
        .mount(&h.server)
        .await;

    let api = InternalApi::new(&h.clients);
    let login = api
        .login(&LoginRequest::new("ada@example.com", "secret"))
        .await
        .expect("login should succeed");

    assert_eq!(login.user.id, 7);
    assert_eq!(login.expires_in, Some(3600));
    assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("access-1"));
    assert_eq!(
        h.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(),
        Some("refresh-1")
    );
    assert!(api.session().is_authenticated().unwrap());
}

#[tokio::test]
async fn test_login_business_failure_leaves_session_empty() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 1001,
            "message": "wrong password",
            "data": null,
        })))
        .mount(&h.server)
        .await;

    let api = InternalApi::new(&h.clients);
    let err = api
        .login(&LoginRequest::new("ada@example.com", "nope"))
        .await
        .unwrap_err();

    assert_eq!(err.business_code(), Some(1001));
    assert_eq!(err.to_string(), "wrong password");
    assert!(h.store.get(TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_profile_sends_stored_bearer() {
    let h = harness().await;
    h.store.set(TOKEN_KEY, "stored-token").unwrap();
    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .and(header("authorization", "Bearer stored-token"))
        .respond_with(ok(user_json(3)))
        .expect(1)
        .mount(&h.server)
        .await;

    let user = InternalApi::new(&h.clients).profile().await.unwrap();
    assert_eq!(user.id, 3);
    assert_eq!(user.avatar, None);
}

#[tokio::test]
async fn test_logout_clears_session_even_when_call_fails() {
    let h = harness().await;
    h.store.set(TOKEN_KEY, "access").unwrap();
    h.store.set(REFRESH_TOKEN_KEY, "refresh").unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let err = InternalApi::new(&h.clients).logout().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(h.store.get(TOKEN_KEY).unwrap().is_none());
    assert!(h.store.get(REFRESH_TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_logout_success() {
    let h = harness().await;
    h.store.set(TOKEN_KEY, "access").unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ok(Value::Null))
        .mount(&h.server)
        .await;

    InternalApi::new(&h.clients).logout().await.unwrap();
    assert!(h.store.get(TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_token_requires_stored_refresh_token() {
    let h = harness().await;
    let err = InternalApi::new(&h.clients).refresh_token().await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotAuthenticated));
}

#[tokio::test]
async fn test_refresh_token_updates_access_token() {
    let h = harness().await;
    h.store.set(TOKEN_KEY, "old-access").unwrap();
    h.store.set(REFRESH_TOKEN_KEY, "refresh-1").unwrap();
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(ok(json!({"token": "new-access"})))
        .mount(&h.server)
        .await;

    let token = InternalApi::new(&h.clients).refresh_token().await.unwrap();

    assert_eq!(token, "new-access");
    assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("new-access"));
    assert_eq!(
        h.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(),
        Some("refresh-1")
    );
}

// ============================================================================
// Users and common data
// ============================================================================

#[tokio::test]
async fn test_list_users_sends_query() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users"))
        .and(query_param("page", "2"))
        .and(query_param("pageSize", "20"))
        .and(query_param("keyword", "ada"))
        .respond_with(ok(json!({
            "list": [user_json(1), user_json(2)],
            "total": 22,
            "page": 2,
            "pageSize": 20,
            "totalPages": 2,
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let query = UserListQuery {
        page: Some(2),
        page_size: Some(20),
        keyword: Some("ada".to_string()),
    };
    let page = InternalApi::new(&h.clients)
        .list_users(&query)
        .await
        .unwrap();

    assert_eq!(page.list.len(), 2);
    assert_eq!(page.total, 22);
    assert_eq!(page.total_pages, 2);
}

#[tokio::test]
async fn test_dict_encodes_type_segment() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/system/dict/user%20status"))
        .respond_with(ok(json!([
            {"label": "Active", "value": 1},
            {"label": "Banned", "value": "banned", "disabled": true},
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    let items = InternalApi::new(&h.clients)
        .dict("user status")
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0].value, DictValue::Number(_)));
    assert_eq!(items[1].value, DictValue::Text("banned".to_string()));
    assert!(items[1].disabled);
}

#[tokio::test]
async fn test_dict_rejects_empty_type_without_request() {
    let h = harness().await;
    let err = InternalApi::new(&h.clients).dict("").await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_code_roundtrip() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/common/send-code"))
        .and(body_json(json!({"email": "ada@example.com", "type": "register"})))
        .respond_with(ok(Value::Null))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/common/verify-code"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "code": "123456",
            "type": "register",
        })))
        .respond_with(ok(json!(true)))
        .mount(&h.server)
        .await;

    let api = InternalApi::new(&h.clients);
    api.send_verify_code("ada@example.com", VerifyCodeType::Register)
        .await
        .unwrap();
    let valid = api
        .verify_code("ada@example.com", "123456", VerifyCodeType::Register)
        .await
        .unwrap();
    assert!(valid);
}

// ============================================================================
// Files
// ============================================================================

#[tokio::test]
async fn test_upload_files_uses_batch_field() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/upload/files"))
        .and(body_string_contains("name=\"files\"; filename=\"a.txt\""))
        .and(body_string_contains("name=\"files\"; filename=\"b.txt\""))
        .respond_with(ok(json!([
            {"url": "https://cdn.example.com/a.txt", "filename": "a.txt"},
            {"url": "https://cdn.example.com/b.txt", "filename": "b.txt"},
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    let files = vec![
        UploadFile::new("a.txt", b"alpha".to_vec()),
        UploadFile::new("b.txt", b"beta".to_vec()),
    ];
    let uploaded = InternalApi::new(&h.clients)
        .upload_files(files, None)
        .await
        .unwrap();

    assert_eq!(uploaded.len(), 2);
    assert_eq!(uploaded[1].filename, "b.txt");
}

#[tokio::test]
async fn test_upload_files_rejects_empty_batch() {
    let h = harness().await;
    let err = InternalApi::new(&h.clients)
        .upload_files(Vec::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));
}

#[tokio::test]
async fn test_delete_file() {
    let h = harness().await;
    Mock::given(method("DELETE"))
        .and(path("/api/upload/file/f-42"))
        .respond_with(ok(Value::Null))
        .expect(1)
        .mount(&h.server)
        .await;

    InternalApi::new(&h.clients).delete_file("f-42").await.unwrap();
}

// ============================================================================
// Third-party APIs
// ============================================================================

#[tokio::test]
async fn test_github_user_is_returned_raw() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "login": "octocat",
            "code": 5,
            "data": "not an envelope",
        })))
        .mount(&h.server)
        .await;

    let api = ThirdPartyApi::new(&h.clients).with_endpoints(Endpoints::all_at(h.server.uri()));
    let user = api.github_user("octocat").await.unwrap();

    assert_eq!(user["login"], "octocat");
    assert_eq!(user["code"], 5);
}

#[tokio::test]
async fn test_weather_passes_city_and_key() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "São Paulo"))
        .and(query_param("appid", "k-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "São Paulo"})))
        .expect(1)
        .mount(&h.server)
        .await;

    let api = ThirdPartyApi::new(&h.clients).with_endpoints(Endpoints::all_at(h.server.uri()));
    let weather = api.weather("São Paulo", "k-1").await.unwrap();
    assert_eq!(weather["name"], "São Paulo");

    let err = api.weather(" ", "k-1").await.unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidInput(_)));
}

#[tokio::test]
async fn test_exchange_rates_default_base() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"base": "USD"})))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest/EUR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"base": "EUR"})))
        .mount(&h.server)
        .await;

    let api = ThirdPartyApi::new(&h.clients).with_endpoints(Endpoints::all_at(h.server.uri()));
    assert_eq!(api.exchange_rates(None).await.unwrap()["base"], "USD");
    assert_eq!(api.exchange_rates(Some("EUR")).await.unwrap()["base"], "EUR");
}

#[tokio::test]
async fn test_ip_info_paths() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ip": "self"})))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/8.8.8.8/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ip": "8.8.8.8"})))
        .mount(&h.server)
        .await;

    let api = ThirdPartyApi::new(&h.clients).with_endpoints(Endpoints::all_at(h.server.uri()));
    assert_eq!(api.ip_info(None).await.unwrap()["ip"], "self");
    assert_eq!(api.ip_info(Some("8.8.8.8")).await.unwrap()["ip"], "8.8.8.8");
}

#[tokio::test]
async fn test_posts_and_create_post() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 2})))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(body_json(json!({"title": "hi", "body": "there", "userId": 1})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 101})))
        .expect(1)
        .mount(&h.server)
        .await;

    let api = ThirdPartyApi::new(&h.clients).with_endpoints(Endpoints::all_at(h.server.uri()));
    assert_eq!(api.posts().await.unwrap().len(), 2);
    assert_eq!(api.post(2).await.unwrap()["id"], 2);

    let created = api
        .create_post(&NewPost {
            title: "hi".to_string(),
            body: "there".to_string(),
            user_id: 1,
        })
        .await
        .unwrap();
    assert_eq!(created["id"], 101);
}

#[tokio::test]
async fn test_third_party_failure_keeps_tokens() {
    let h = harness().await;
    h.store.set(TOKEN_KEY, "keep-me").unwrap();
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let api = ThirdPartyApi::new(&h.clients).with_endpoints(Endpoints::all_at(h.server.uri()));
    let err = api.github_user("ghost").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(h.store.get(TOKEN_KEY).unwrap().as_deref(), Some("keep-me"));
}
