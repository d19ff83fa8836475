//! Login, authenticated calls and session expiry with a file-backed store.

use portico_api::{InternalApi, LoginRequest};
use portico_client::{ErrorKind, TokenStore, REFRESH_TOKEN_KEY, TOKEN_KEY};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{env, envelope, user};

#[tokio::test]
async fn test_login_then_authenticated_call_then_expiry() {
    let env = env().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(envelope(
            0,
            "success",
            json!({"user": user(9), "token": "jwt-a", "refreshToken": "rt-a"}),
        ))
        .mount(&env.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .and(header("authorization", "Bearer jwt-a"))
        .respond_with(envelope(0, "success", user(9)))
        .up_to_n_times(1)
        .mount(&env.server)
        .await;

    let api = InternalApi::new(&env.clients);
    api.login(&LoginRequest::new("grace@example.com", "hopper"))
        .await
        .expect("login should succeed");

    // Tokens are persisted to disk, not just held in memory.
    assert_eq!(env.store.list().unwrap(), vec!["refreshToken", "token"]);
    assert!(env.store.stored_at(TOKEN_KEY).unwrap().is_some());

    let me = api.profile().await.expect("profile should load");
    assert_eq!(me.id, 9);

    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&env.server)
        .await;

    let err = api.profile().await.unwrap_err();
    let client_err = err.client_error().expect("client failure");
    assert!(matches!(client_err.kind, ErrorKind::Http { status: 401, .. }));

    assert!(env.store.get(TOKEN_KEY).unwrap().is_none());
    assert!(env.store.get(REFRESH_TOKEN_KEY).unwrap().is_none());
    assert!(env.store.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_tokens_survive_a_new_client_pair() {
    let env = env().await;
    env.store.set(TOKEN_KEY, "persisted").unwrap();

    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .and(header("authorization", "Bearer persisted"))
        .respond_with(envelope(0, "success", user(4)))
        .expect(1)
        .mount(&env.server)
        .await;

    let reopened = portico_auth::FileTokenStore::with_path(env.store.base_path());
    assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("persisted"));

    let me = InternalApi::new(&env.clients).profile().await.unwrap();
    assert_eq!(me.id, 4);
}
