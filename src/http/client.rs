//! Connection-pooled HTTP client
//!
//! A thin wrapper over `reqwest::Client` that injects the user agent on every
//! request and turns non-2xx responses into errors.

use reqwest::header::USER_AGENT;
use reqwest::{Client, Response, Url};
use std::sync::Arc;
use std::time::Duration;

use super::agent::{RotatingAgent, StaticAgent, UserAgentSource};
use crate::config::Config;
use crate::error::HttpError;

const POOL_MAX_IDLE_PER_HOST: usize = 10;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloneable handle to a shared connection pool
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    agents: Arc<dyn UserAgentSource>,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Client with the `[download]` user agent settings and the given timeout
    pub fn from_config(config: &Config, timeout: Duration) -> Result<Self, HttpError> {
        let builder = HttpClientBuilder::new().timeout(timeout);
        let builder = if config.download.rotate_user_agents {
            builder.agent_source(RotatingAgent::browsers())
        } else {
            builder.user_agent(config.download.user_agent.clone())
        };
        builder.build()
    }

    /// Parse `url` and issue a GET request
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.get_url(url).await
    }

    /// Issue a GET request, failing on transport errors and non-2xx statuses
    pub async fn get_url(&self, url: Url) -> Result<Response, HttpError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, self.agents.next_agent())
            .send()
            .await
            .map_err(|source| HttpError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

/// Builder for creating HTTP clients with configuration
pub struct HttpClientBuilder {
    timeout: Duration,
    agents: Arc<dyn UserAgentSource>,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            agents: Arc::new(StaticAgent::default()),
        }
    }

    /// Overall per-request timeout, body included
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(self, agent: impl Into<String>) -> Self {
        self.agent_source(StaticAgent::new(agent))
    }

    pub fn agent_source(mut self, source: impl UserAgentSource + 'static) -> Self {
        self.agents = Arc::new(source);
        self
    }

    pub fn build(self) -> Result<HttpClient, HttpError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()
            .map_err(HttpError::Client)?;

        Ok(HttpClient {
            client,
            agents: self.agents,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use axum::http::HeaderMap;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    #[tokio::test]
    async fn test_client_builder() {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("anna-dl-test")
            .build();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_sending() {
        let client = HttpClient::builder().build().unwrap();
        let err = client.get("not a url").await.unwrap_err();
        assert!(matches!(err, HttpError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_user_agent_is_injected() {
        let app = Router::new().route(
            "/ua",
            get(|headers: HeaderMap| async move {
                headers
                    .get("user-agent")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string()
            }),
        );
        let base = test_support::serve(app).await;
        let client = HttpClient::builder()
            .agent_source(RotatingAgent::new(["first", "second"]).unwrap())
            .build()
            .unwrap();

        let url = format!("{}/ua", base);
        let first = client.get(&url).await.unwrap().text().await.unwrap();
        let second = client.get(&url).await.unwrap().text().await.unwrap();
        assert_eq!(first, "first");
        assert_eq!(second, "second");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let app = Router::new().route("/gone", get(|| async { StatusCode::NOT_FOUND }));
        let base = test_support::serve(app).await;
        let client = HttpClient::builder().build().unwrap();

        let err = client.get(&format!("{}/gone", base)).await.unwrap_err();
        assert!(matches!(err, HttpError::Status { status: 404, .. }));
    }
}
