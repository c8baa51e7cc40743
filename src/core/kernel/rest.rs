use crate::core::config::ClientConfig;
use crate::core::errors::ApiError;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{instrument, trace};

/// Underlying HTTP transport
///
/// One call is one synchronous POST exchange with the API endpoint. Retries
/// and connection pooling are the implementation's business, not the
/// caller's.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Full URL requests are posted to
    fn endpoint(&self) -> &str;

    /// POST a JSON body with extra headers and return the raw response body.
    ///
    /// A non-success status is an error; the body is not read in that case.
    async fn post(
        &self,
        body: Vec<u8>,
        headers: HashMap<String, String>,
    ) -> Result<Vec<u8>, ApiError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Normalized API endpoint
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Idle connections kept per host
    pub max_idle_per_host: usize,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(5),
            max_idle_per_host: 1024,
            user_agent: format!("centrix/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_idle_per_host(mut self, max_idle_per_host: usize) -> Self {
        self.max_idle_per_host = max_idle_per_host;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

impl From<&ClientConfig> for RestClientConfig {
    fn from(config: &ClientConfig) -> Self {
        Self::new(config.api_endpoint())
            .with_timeout(config.timeout)
            .with_max_idle_per_host(config.max_idle_per_host)
            .with_user_agent(config.user_agent.clone())
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    http_client: Option<Client>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            http_client: None,
        }
    }

    /// Use a caller-configured `reqwest::Client` (proxy, TLS, pool settings).
    ///
    /// The configured timeout is still applied per request.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<ReqwestRest, ApiError> {
        let client = match self.http_client {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.config.timeout)
                .pool_max_idle_per_host(self.config.max_idle_per_host)
                .user_agent(&self.config.user_agent)
                .build()
                .map_err(|e| {
                    ApiError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
                })?,
        };

        Ok(ReqwestRest {
            client,
            config: self.config,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn new(endpoint: String) -> Result<Self, ApiError> {
        RestClientBuilder::new(RestClientConfig::new(endpoint)).build()
    }

    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    fn map_send_error(err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else {
            ApiError::NetworkError(format!("Request failed: {}", err))
        }
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    #[instrument(skip(self, body, headers), fields(endpoint = %self.config.endpoint, body_len = body.len()))]
    async fn post(
        &self,
        body: Vec<u8>,
        headers: HashMap<String, String>,
    ) -> Result<Vec<u8>, ApiError> {
        let mut request = self
            .client
            .post(&self.config.endpoint)
            .timeout(self.config.timeout)
            .header(CONTENT_TYPE, "application/json");

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| Self::map_send_error(&e))?;

        let status = response.status();
        trace!(status = %status, "API response received");

        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                code: status.as_u16(),
                status: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Self::map_send_error(&e))?;
        Ok(bytes.to_vec())
    }
}
