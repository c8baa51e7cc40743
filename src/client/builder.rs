use crate::client::connector::ApiClient;
use crate::core::config::ClientConfig;
use crate::core::errors::ApiError;
use crate::core::kernel::{
    BatchTransport, HmacSigner, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
    Signer,
};
use std::sync::Arc;

/// Builds an [`ApiClient`] from a [`ClientConfig`]
pub struct ClientBuilder {
    config: ClientConfig,
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            http_client: None,
        }
    }

    /// Use a caller-configured `reqwest::Client` instead of the pooled default
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    fn signer(&self) -> Option<Arc<dyn Signer>> {
        if self.config.signs_requests() {
            Some(Arc::new(HmacSigner::new(self.config.secret().to_string())))
        } else {
            None
        }
    }

    /// Build a client on the reqwest transport
    pub fn build(self) -> Result<ApiClient<ReqwestRest>, ApiError> {
        self.config.validate()?;
        let signer = self.signer();

        let mut rest_builder = RestClientBuilder::new(RestClientConfig::from(&self.config));
        if let Some(client) = self.http_client {
            rest_builder = rest_builder.with_http_client(client);
        }
        let rest = rest_builder.build()?;

        Ok(ApiClient::new(BatchTransport::new(rest, signer)))
    }

    /// Build a client on a custom transport. Signing still follows the
    /// configuration; the endpoint is whatever the transport posts to.
    pub fn build_with_rest<R: RestClient>(self, rest: R) -> Result<ApiClient<R>, ApiError> {
        self.config.validate()?;
        Ok(ApiClient::new(BatchTransport::new(rest, self.signer())))
    }
}
