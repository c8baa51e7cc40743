use crate::core::errors::ApiError;
use crate::core::kernel::rest::RestClient;
use crate::core::kernel::signer::Signer;
use crate::core::types::{Command, CommandResult};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Sends a batch of commands as one signed JSON array and returns the
/// per-command results in request order.
pub struct BatchTransport<R: RestClient> {
    rest: R,
    signer: Option<Arc<dyn Signer>>,
}

impl<R: RestClient> std::fmt::Debug for BatchTransport<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchTransport")
            .field("endpoint", &self.rest.endpoint())
            .field("signed", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: RestClient> BatchTransport<R> {
    /// Without a signer requests go out unsigned (insecure mode).
    pub fn new(rest: R, signer: Option<Arc<dyn Signer>>) -> Self {
        Self { rest, signer }
    }

    pub fn rest(&self) -> &R {
        &self.rest
    }

    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    /// Serialize, sign, POST and decode one batch.
    ///
    /// `result[i]` is the reply to `commands[i]`. A response whose length
    /// differs from the request is rejected as a whole.
    #[instrument(skip(self, commands), fields(endpoint = %self.rest.endpoint(), batch_size = commands.len()))]
    pub async fn send_batch(&self, commands: &[Command]) -> Result<Vec<CommandResult>, ApiError> {
        let body = serde_json::to_vec(commands).map_err(|e| {
            ApiError::SerializationError(format!("Failed to serialize commands: {}", e))
        })?;

        let headers = match &self.signer {
            Some(signer) => signer.sign_request(&body)?,
            None => HashMap::new(),
        };

        let response = self.rest.post(body, headers).await?;

        let results: Vec<CommandResult> = serde_json::from_slice(&response).map_err(|e| {
            ApiError::DeserializationError(format!("Failed to parse API response: {}", e))
        })?;

        if results.len() != commands.len() {
            return Err(ApiError::MalformedResponse {
                expected: commands.len(),
                received: results.len(),
            });
        }

        debug!(
            failed = results.iter().filter(|r| !r.is_ok()).count(),
            "batch delivered"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::signer::{generate_api_sign, HmacSigner, API_SIGN_HEADER};
    use crate::core::types::CommandKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays a canned response and records what was posted
    struct StubRest {
        response: Vec<u8>,
        requests: Mutex<Vec<(Vec<u8>, HashMap<String, String>)>>,
    }

    impl StubRest {
        fn new(response: &str) -> Self {
            Self {
                response: response.as_bytes().to_vec(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RestClient for StubRest {
        fn endpoint(&self) -> &str {
            "http://stub/api/"
        }

        async fn post(
            &self,
            body: Vec<u8>,
            headers: HashMap<String, String>,
        ) -> Result<Vec<u8>, ApiError> {
            self.requests.lock().unwrap().push((body, headers));
            Ok(self.response.clone())
        }
    }

    fn commands(n: usize) -> Vec<Command> {
        (0..n)
            .map(|i| {
                Command::new(
                    format!("uid-{}", i),
                    CommandKind::History {
                        channel: format!("chan-{}", i),
                    },
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_signed_batch_carries_signature_of_exact_body() {
        let transport = BatchTransport::new(
            StubRest::new(r#"[{"body":{}},{"body":{}}]"#),
            Some(Arc::new(HmacSigner::new("secret".to_string()))),
        );
        let results = transport.send_batch(&commands(2)).await.unwrap();
        assert_eq!(results.len(), 2);

        let requests = transport.rest().requests.lock().unwrap();
        let (body, headers) = &requests[0];
        assert_eq!(
            headers.get(API_SIGN_HEADER),
            Some(&generate_api_sign("secret", body))
        );

        let sent: serde_json::Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent[0]["uid"], "uid-0");
        assert_eq!(sent[1]["params"]["channel"], "chan-1");
    }

    #[tokio::test]
    async fn test_unsigned_batch_has_no_signature() {
        let transport = BatchTransport::new(StubRest::new(r#"[{"body":{}}]"#), None);
        transport.send_batch(&commands(1)).await.unwrap();

        let requests = transport.rest().requests.lock().unwrap();
        assert!(requests[0].1.is_empty());
    }

    #[tokio::test]
    async fn test_length_mismatch_is_malformed() {
        let transport = BatchTransport::new(StubRest::new(r#"[{"body":{}}]"#), None);
        let err = transport.send_batch(&commands(3)).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::MalformedResponse {
                expected: 3,
                received: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_non_array_response_is_rejected() {
        let transport = BatchTransport::new(StubRest::new(r#"{"error":"oops"}"#), None);
        let err = transport.send_batch(&commands(1)).await.unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[tokio::test]
    async fn test_per_command_errors_do_not_fail_the_batch() {
        let transport = BatchTransport::new(
            StubRest::new(r#"[{"body":{}},{"error":"permission denied","body":null}]"#),
            None,
        );
        let results = transport.send_batch(&commands(2)).await.unwrap();
        assert!(results[0].is_ok());
        assert_eq!(results[1].error_message(), Some("permission denied"));
    }
}
