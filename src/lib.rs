//! API client for the Centrifugo real-time messaging server.
//!
//! Commands are either sent one at a time or buffered and flushed together
//! in a single signed POST request:
//!
//! ```rust,no_run
//! use centrix::{create_client, ClientConfig};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), centrix::ApiError> {
//! let client = create_client(ClientConfig::new(
//!     "http://localhost:8000".to_string(),
//!     "secret".to_string(),
//! ))?;
//!
//! let ok = client.publish("$public:chat", &json!({"input": "test"})).await?;
//! assert!(ok);
//!
//! client.add_publish("$public:chat", &json!({"input": "test1"}))?;
//! client.add_publish("$public:chat", &json!({"input": "test2"}))?;
//! let results = client.send().await?;
//! assert_eq!(results.len(), 2);
//! # Ok(())
//! # }
//! ```
pub mod client;
pub mod core;

pub use client::{create_client, create_insecure_client, ApiClient, ClientBuilder};
pub use crate::core::{
    config::ClientConfig,
    errors::ApiError,
    kernel::{generate_api_sign, generate_channel_sign, generate_client_token},
    types::*,
};
