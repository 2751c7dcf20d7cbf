//! HTTP binding for the two read endpoints the verifier uses.
//!
//! * `GET {endpoint}orgs` returns `{"orgs": [ ... ]}`
//! * `GET {endpoint}org/{id}/integrations` returns `{"<type>": "<id>", ...}`
//!
//! Requests authenticate with `Authorization: token <api token>`. A non-2xx
//! answer becomes [`ApiError::Http`] whose message is taken from the error
//! body's `message` or `error` field, falling back to the raw body.

use super::{ApiError, SnykApi};
use crate::resource::{IntegrationList, Organization, ResourceId};
use log::{debug, trace};
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.snyk.io/v1/";

/// Connection settings for [`HttpClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL every request path is joined onto
    pub endpoint: String,
    /// API token sent in the `Authorization` header
    pub token: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            user_agent: format!("snyk-acctest/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Remote API client over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
    token: String,
}

#[derive(Deserialize)]
struct OrganizationsResponse {
    orgs: Vec<Organization>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl HttpClient {
    /// Build a client from the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base = parse_endpoint(&config.endpoint)?;
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base,
            token: config.token,
        })
    }

    /// The endpoint every request path is joined onto.
    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{}{}: {}", self.base, path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let transport = |source: reqwest::Error| ApiError::Transport {
            method: "GET".to_string(),
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, format!("token {}", self.token))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        trace!("GET {} -> {} ({} bytes)", url, status, body.len());

        if !status.is_success() {
            return Err(ApiError::Http {
                method: "GET".to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl SnykApi for HttpClient {
    type Error = ApiError;

    async fn list_organizations(&self) -> Result<Vec<Organization>, Self::Error> {
        let response: OrganizationsResponse = self.get_json("orgs").await?;
        debug!("Listed {} organizations", response.orgs.len());
        Ok(response.orgs)
    }

    async fn list_integrations(
        &self,
        organization_id: &ResourceId,
    ) -> Result<IntegrationList, Self::Error> {
        let path = format!("org/{}/integrations", organization_id);
        let list: IntegrationList = self.get_json(&path).await?;
        debug!(
            "Listed {} integrations for organization '{}'",
            list.len(),
            organization_id
        );
        Ok(list)
    }
}

/// Parse an endpoint, making sure it ends with `/` so relative paths join
/// below it instead of replacing its last segment.
fn parse_endpoint(endpoint: &str) -> Result<Url, ApiError> {
    let normalized = if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{}/", endpoint)
    };
    Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", endpoint, e)))
}

/// Extract a human-readable message from an error response body.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            return message;
        }
        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            return error;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        trimmed.to_string()
    }
}
