//! Third-party calls share the token store but never touch the session.

use portico_api::{Endpoints, ThirdPartyApi};
use portico_client::{TokenStore, TOKEN_KEY};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::env;

#[tokio::test]
async fn test_third_party_body_passes_through_with_bearer() {
    let env = env().await;
    env.store.set(TOKEN_KEY, "shared").unwrap();

    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .and(header("authorization", "Bearer shared"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "message": "success",
            "data": {"login": "octocat"},
        })))
        .expect(1)
        .mount(&env.server)
        .await;

    let api = ThirdPartyApi::new(&env.clients).with_endpoints(Endpoints::all_at(env.server.uri()));
    let body = api.github_user("octocat").await.unwrap();

    // Envelope-shaped bodies are not unwrapped on the external client.
    assert_eq!(body["data"]["login"], "octocat");
}

#[tokio::test]
async fn test_third_party_401_keeps_session() {
    let env = env().await;
    env.store.set(TOKEN_KEY, "shared").unwrap();

    Mock::given(method("GET"))
        .and(path("/latest/USD"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&env.server)
        .await;

    let api = ThirdPartyApi::new(&env.clients).with_endpoints(Endpoints::all_at(env.server.uri()));
    let err = api.exchange_rates(None).await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(env.store.get(TOKEN_KEY).unwrap().as_deref(), Some("shared"));
}
