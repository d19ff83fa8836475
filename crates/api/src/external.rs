//! Third-party services, called through the external client.
//!
//! Responses come back exactly as the third party sent them.

use serde_json::Value;
use tracing::instrument;

use portico_client::{ApiClients, HttpClient, Params};

use crate::error::{Error, ErrorKind, Result};
use crate::internal::segment;
use crate::types::NewPost;

/// Currency used when no base currency is given.
pub const DEFAULT_BASE_CURRENCY: &str = "USD";

/// Root URLs of the third-party services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub github: String,
    pub jsonplaceholder: String,
    pub openweathermap: String,
    pub exchange_rates: String,
    pub ipapi: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github: "https://api.github.com".to_string(),
            jsonplaceholder: "https://jsonplaceholder.typicode.com".to_string(),
            openweathermap: "https://api.openweathermap.org/data/2.5".to_string(),
            exchange_rates: "https://api.exchangerate-api.com/v4".to_string(),
            ipapi: "https://ipapi.co".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at the same root, e.g. a mock server.
    pub fn all_at(root: impl Into<String>) -> Self {
        let root = root.into().trim_end_matches('/').to_string();
        Self {
            github: root.clone(),
            jsonplaceholder: root.clone(),
            openweathermap: root.clone(),
            exchange_rates: root.clone(),
            ipapi: root,
        }
    }
}

/// Typed access to the third-party APIs.
#[derive(Debug, Clone)]
pub struct ThirdPartyApi {
    client: HttpClient,
    endpoints: Endpoints,
}

impl ThirdPartyApi {
    /// Use the external client of `clients` with the public endpoints.
    pub fn new(clients: &ApiClients) -> Self {
        Self {
            client: clients.external().clone(),
            endpoints: Endpoints::default(),
        }
    }

    /// Override the service roots.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// GitHub user profile.
    #[instrument(skip(self))]
    pub async fn github_user(&self, username: &str) -> Result<Value> {
        let url = format!(
            "{}/users/{}",
            self.endpoints.github,
            segment("username", username)?
        );
        Ok(self.client.get(&url, None, None).await?)
    }

    /// All JSONPlaceholder posts.
    #[instrument(skip(self))]
    pub async fn posts(&self) -> Result<Vec<Value>> {
        let url = format!("{}/posts", self.endpoints.jsonplaceholder);
        Ok(self.client.get(&url, None, None).await?)
    }

    #[instrument(skip(self))]
    pub async fn post(&self, id: u64) -> Result<Value> {
        let url = format!("{}/posts/{id}", self.endpoints.jsonplaceholder);
        Ok(self.client.get(&url, None, None).await?)
    }

    #[instrument(skip(self))]
    pub async fn create_post(&self, post: &NewPost) -> Result<Value> {
        let url = format!("{}/posts", self.endpoints.jsonplaceholder);
        Ok(self.client.post(&url, Some(post), None).await?)
    }

    /// Current weather for a city from OpenWeatherMap.
    #[instrument(skip(self, api_key))]
    pub async fn weather(&self, city: &str, api_key: &str) -> Result<Value> {
        if city.trim().is_empty() || api_key.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "city and api key are required".to_string(),
            )));
        }

        let url = format!("{}/weather", self.endpoints.openweathermap);
        let params = Params::new().insert("q", city).insert("appid", api_key);
        Ok(self.client.get(&url, Some(&params), None).await?)
    }

    /// Exchange rates against `base`, or [`DEFAULT_BASE_CURRENCY`].
    #[instrument(skip(self))]
    pub async fn exchange_rates(&self, base: Option<&str>) -> Result<Value> {
        let base = base.unwrap_or(DEFAULT_BASE_CURRENCY);
        let url = format!(
            "{}/latest/{}",
            self.endpoints.exchange_rates,
            segment("base currency", base)?
        );
        Ok(self.client.get(&url, None, None).await?)
    }

    /// Geolocation for `ip`, or for the caller's own address.
    #[instrument(skip(self))]
    pub async fn ip_info(&self, ip: Option<&str>) -> Result<Value> {
        let url = match ip {
            Some(ip) => format!("{}/{}/json/", self.endpoints.ipapi, segment("ip", ip)?),
            None => format!("{}/json/", self.endpoints.ipapi),
        };
        Ok(self.client.get(&url, None, None).await?)
    }
}
