/// Centrix kernel - transport layer for the server HTTP API
///
/// # Architecture
///
/// ## Transport
/// - `RestClient`: pluggable HTTP POST interface
/// - `ReqwestRest`: reqwest-backed implementation with pooling and timeout
///
/// ## Authentication
/// - `Signer`: request signing interface
/// - `HmacSigner`: HMAC-SHA256 of the request body, sent as `X-API-Sign`
/// - `generate_client_token` / `generate_channel_sign`: tokens handed to
///   connecting front-end clients
///
/// ## Batching
/// - `BatchTransport`: one JSON array request per batch, results zipped
///   positionally with the submitted commands
///
/// # Example
/// ```rust,no_run
/// use centrix::core::kernel::*;
/// use centrix::core::types::CommandKind;
/// use centrix::core::buffer::CommandBuffer;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let rest = RestClientBuilder::new(RestClientConfig::new(
///     "http://localhost:8000/api/".to_string(),
/// ))
/// .build()?;
/// let signer: Arc<dyn Signer> = Arc::new(HmacSigner::new("secret".to_string()));
/// let transport = BatchTransport::new(rest, Some(signer));
///
/// let buffer = CommandBuffer::new();
/// buffer.append(CommandKind::Channels {});
/// let results = transport.send_batch(&buffer.drain_all()).await?;
/// assert_eq!(results.len(), 1);
/// # Ok(())
/// # }
/// ```
pub mod batch;
pub mod rest;
pub mod signer;

// Re-export key types for convenience
pub use batch::BatchTransport;
pub use rest::{ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{
    generate_api_sign, generate_channel_sign, generate_client_token, HmacSigner,
    SignatureResult, Signer, API_SIGN_HEADER,
};
