use crate::core::errors::ApiError;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the request body
pub const API_SIGN_HEADER: &str = "X-API-Sign";

/// Result type for signing operations: headers to attach to the request
pub type SignatureResult = Result<HashMap<String, String>, ApiError>;

/// Signer trait for request authentication
pub trait Signer: Send + Sync {
    /// Sign the exact request body bytes and return the headers to send
    fn sign_request(&self, body: &[u8]) -> SignatureResult;
}

/// HMAC-SHA256 signer keyed by the project secret
pub struct HmacSigner {
    secret: Secret<String>,
}

impl HmacSigner {
    pub fn new(secret: String) -> Self {
        Self {
            secret: Secret::new(secret),
        }
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn sign_request(&self, body: &[u8]) -> SignatureResult {
        let mut headers = HashMap::new();
        headers.insert(
            API_SIGN_HEADER.to_string(),
            generate_api_sign(self.secret.expose_secret(), body),
        );
        Ok(headers)
    }
}

/// Feed every segment, in order, into one HMAC instance.
fn hmac_hex(secret: &str, segments: &[&[u8]]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    for segment in segments {
        mac.update(segment);
    }
    hex::encode(mac.finalize().into_bytes())
}

/// Sign an HTTP API request body
#[must_use]
pub fn generate_api_sign(secret: &str, data: &[u8]) -> String {
    hmac_hex(secret, &[data])
}

/// Connection token for a client, from user ID, timestamp and info JSON
/// string, in that order.
#[must_use]
pub fn generate_client_token(secret: &str, user: &str, timestamp: &str, info: &str) -> String {
    hmac_hex(
        secret,
        &[user.as_bytes(), timestamp.as_bytes(), info.as_bytes()],
    )
}

/// Sign proving a client's permission to subscribe to a private channel.
/// Segments are fed as client ID, channel, channel data.
#[must_use]
pub fn generate_channel_sign(secret: &str, client: &str, channel: &str, channel_data: &str) -> String {
    hmac_hex(
        secret,
        &[client.as_bytes(), channel.as_bytes(), channel_data.as_bytes()],
    )
}
