//! Fetch a GitHub user through the external client and print it.
//!
//! ```sh
//! RUST_LOG=portico_client=debug cargo run --bin api-demo -- octocat
//! ```

use std::sync::Arc;

use anyhow::Context;
use portico_api::ThirdPartyApi;
use portico_client::{ApiClients, MemoryTokenStore, TracingNotifier};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let username = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "octocat".to_string());

    let clients = ApiClients::from_env(Arc::new(MemoryTokenStore::new()), Arc::new(TracingNotifier))
        .context("failed to build API clients")?;

    let user = ThirdPartyApi::new(&clients)
        .github_user(&username)
        .await
        .with_context(|| format!("failed to fetch GitHub user {username}"))?;

    println!("{}", serde_json::to_string_pretty(&user)?);
    Ok(())
}
