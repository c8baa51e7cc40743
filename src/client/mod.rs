pub mod builder;
pub mod codec;
pub mod connector;

use crate::core::config::ClientConfig;
use crate::core::errors::ApiError;
use crate::core::kernel::ReqwestRest;
use std::time::Duration;

pub use builder::ClientBuilder;
pub use connector::ApiClient;

/// Create a client that signs every API request with the configured secret
pub fn create_client(config: ClientConfig) -> Result<ApiClient<ReqwestRest>, ApiError> {
    ClientBuilder::new(config).build()
}

/// Create a client that never signs API requests.
///
/// Useful when the server's `/api/` endpoint is reachable only from a
/// trusted network.
pub fn create_insecure_client(
    base_url: &str,
    timeout: Duration,
) -> Result<ApiClient<ReqwestRest>, ApiError> {
    create_client(ClientConfig::insecure(base_url.to_string()).with_timeout(timeout))
}
