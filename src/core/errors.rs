use crate::core::types::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("client command buffer not empty, send commands or reset client")]
    BufferNotEmpty,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("wrong status code: {code} {status}")]
    UnexpectedStatus { code: u16, status: String },

    #[error("malformed response returned from server: expected {expected} results, received {received}")]
    MalformedResponse { expected: usize, received: usize },

    #[error("Command error: {0}")]
    CommandError(String),

    #[error("command {0} was removed from the buffer before it was sent")]
    CommandDropped(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    /// A transport failure on the flush path. The buffer was already drained,
    /// so the commands that were in flight are handed back to the caller.
    #[error("{} command(s) not delivered: {source}", .commands.len())]
    Undelivered {
        commands: Vec<Command>,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Connection failures, timeouts and non-success HTTP statuses.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::Timeout(_) | Self::UnexpectedStatus { .. } => true,
            Self::Undelivered { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// Whether re-sending could succeed. This says nothing about idempotency:
    /// a timed out `publish` may already have reached subscribers.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::Timeout(_) => true,
            Self::UnexpectedStatus { code, .. } => *code >= 500,
            Self::Undelivered { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Take back the commands of a failed flush, if this error carries them.
    pub fn into_undelivered(self) -> Option<Vec<Command>> {
        match self {
            Self::Undelivered { commands, .. } => Some(commands),
            _ => None,
        }
    }
}
