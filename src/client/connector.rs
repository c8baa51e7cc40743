use crate::client::codec::{
    check_result, decode_broadcast, decode_channels, decode_disconnect, decode_history,
    decode_presence, decode_publish, decode_stats, decode_unsubscribe,
};
use crate::core::buffer::CommandBuffer;
use crate::core::errors::ApiError;
use crate::core::kernel::{BatchTransport, ReqwestRest, RestClient};
use crate::core::types::{ClientInfo, Command, CommandKind, CommandResult, Message, Stats};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{instrument, warn};

/// API client for one project registered in the server.
///
/// Commands can be buffered with the `add_*` methods and flushed together
/// with [`send`](Self::send), or sent one at a time with the single-shot
/// methods (`publish`, `presence`, ...), which refuse to run while other
/// commands are pending.
///
/// # Concurrency
///
/// The client is `Send + Sync`; share it with `Arc`. Single-shot calls and
/// `send` are serialized against each other, so two single-shot calls never
/// see each other's commands. Raw `add_*` calls do not take part in that
/// serialization: a command added from another task between the emptiness
/// check and the flush of a single-shot call is sent in the same request,
/// and its result is discarded. Use one client per batch producer, or
/// coordinate externally, when mixing both styles.
///
/// # Failed flushes
///
/// The buffer is drained before the request is made. On a transport failure
/// the drained commands come back in [`ApiError::Undelivered`]; they are not
/// retried because re-sending a `publish` may duplicate it.
pub struct ApiClient<R: RestClient = ReqwestRest> {
    buffer: CommandBuffer,
    transport: BatchTransport<R>,
    single_shot: Mutex<()>,
}

impl<R: RestClient> std::fmt::Debug for ApiClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("transport", &self.transport)
            .field("pending", &self.buffer.len())
            .finish_non_exhaustive()
    }
}

fn encode<T: Serialize + ?Sized>(data: &T) -> Result<Value, ApiError> {
    serde_json::to_value(data)
        .map_err(|e| ApiError::SerializationError(format!("Failed to serialize data: {}", e)))
}

fn to_channels<I>(channels: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    channels.into_iter().map(Into::into).collect()
}

impl<R: RestClient> ApiClient<R> {
    pub fn new(transport: BatchTransport<R>) -> Self {
        Self {
            buffer: CommandBuffer::new(),
            transport,
            single_shot: Mutex::new(()),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.transport.rest().endpoint()
    }

    /// Whether requests carry an `X-API-Sign` header
    pub fn is_signed(&self) -> bool {
        self.transport.is_signed()
    }

    /// Number of buffered commands
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all buffered commands. Returns how many were dropped.
    pub fn reset(&self) -> usize {
        self.buffer.clear()
    }

    /// Buffer an already built command. Returns its uid.
    pub fn add(&self, kind: CommandKind) -> String {
        self.buffer.append(kind)
    }

    /// Buffer commands handed back by a failed flush. Each gets a new uid.
    pub fn requeue(&self, commands: Vec<Command>) -> Vec<String> {
        commands
            .into_iter()
            .map(|command| self.buffer.append(command.into_kind()))
            .collect()
    }

    pub fn add_publish<T: Serialize + ?Sized>(
        &self,
        channel: &str,
        data: &T,
    ) -> Result<String, ApiError> {
        Ok(self.add(CommandKind::Publish {
            channel: channel.to_string(),
            data: encode(data)?,
            client: None,
        }))
    }

    /// Like [`add_publish`](Self::add_publish), with the ID of the client
    /// that initiated the event.
    pub fn add_publish_client<T: Serialize + ?Sized>(
        &self,
        channel: &str,
        data: &T,
        client: &str,
    ) -> Result<String, ApiError> {
        Ok(self.add(CommandKind::Publish {
            channel: channel.to_string(),
            data: encode(data)?,
            client: Some(client.to_string()),
        }))
    }

    pub fn add_broadcast<I, T>(&self, channels: I, data: &T) -> Result<String, ApiError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        T: Serialize + ?Sized,
    {
        Ok(self.add(CommandKind::Broadcast {
            channels: to_channels(channels),
            data: encode(data)?,
            client: None,
        }))
    }

    pub fn add_broadcast_client<I, T>(
        &self,
        channels: I,
        data: &T,
        client: &str,
    ) -> Result<String, ApiError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        T: Serialize + ?Sized,
    {
        Ok(self.add(CommandKind::Broadcast {
            channels: to_channels(channels),
            data: encode(data)?,
            client: Some(client.to_string()),
        }))
    }

    pub fn add_unsubscribe(&self, channel: &str, user: &str) -> String {
        self.add(CommandKind::Unsubscribe {
            channel: channel.to_string(),
            user: user.to_string(),
        })
    }

    pub fn add_disconnect(&self, user: &str) -> String {
        self.add(CommandKind::Disconnect {
            user: user.to_string(),
        })
    }

    pub fn add_presence(&self, channel: &str) -> String {
        self.add(CommandKind::Presence {
            channel: channel.to_string(),
        })
    }

    pub fn add_history(&self, channel: &str) -> String {
        self.add(CommandKind::History {
            channel: channel.to_string(),
        })
    }

    pub fn add_channels(&self) -> String {
        self.add(CommandKind::Channels {})
    }

    pub fn add_stats(&self) -> String {
        self.add(CommandKind::Stats {})
    }

    /// Send every buffered command in one request.
    ///
    /// `result[i]` answers the i-th buffered command. Per-command errors are
    /// left in the results for the caller to inspect. An empty buffer
    /// returns an empty result without touching the network.
    pub async fn send(&self) -> Result<Vec<CommandResult>, ApiError> {
        let _guard = self.single_shot.lock().await;
        self.flush().await.map(|(_, results)| results)
    }

    async fn flush(&self) -> Result<(Vec<Command>, Vec<CommandResult>), ApiError> {
        let commands = self.buffer.drain_all();
        if commands.is_empty() {
            return Ok((commands, Vec::new()));
        }

        match self.transport.send_batch(&commands).await {
            Ok(results) => Ok((commands, results)),
            Err(err) if err.is_transport() => Err(ApiError::Undelivered {
                commands,
                source: Box::new(err),
            }),
            Err(err) => Err(err),
        }
    }

    /// Buffer one command, flush, and decode its own result.
    #[instrument(skip(self, kind, decode), fields(method = kind.method()))]
    async fn execute<T>(
        &self,
        kind: CommandKind,
        decode: fn(&Value) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let _guard = self.single_shot.lock().await;
        if !self.buffer.is_empty() {
            return Err(ApiError::BufferNotEmpty);
        }

        let uid = self.buffer.append(kind);
        let (commands, results) = self.flush().await?;

        if commands.len() > 1 {
            warn!(
                foreign = commands.len() - 1,
                "commands buffered concurrently were flushed by a single-shot call"
            );
        }

        let index = commands
            .iter()
            .position(|c| c.uid() == uid)
            .ok_or(ApiError::CommandDropped(uid))?;

        decode(check_result(&results[index])?)
    }

    /// Publish data into a channel
    pub async fn publish<T: Serialize + ?Sized>(
        &self,
        channel: &str,
        data: &T,
    ) -> Result<bool, ApiError> {
        let kind = CommandKind::Publish {
            channel: channel.to_string(),
            data: encode(data)?,
            client: None,
        };
        self.execute(kind, decode_publish).await
    }

    /// Publish data into a channel on behalf of the client that initiated it
    pub async fn publish_client<T: Serialize + ?Sized>(
        &self,
        channel: &str,
        data: &T,
        client: &str,
    ) -> Result<bool, ApiError> {
        let kind = CommandKind::Publish {
            channel: channel.to_string(),
            data: encode(data)?,
            client: Some(client.to_string()),
        };
        self.execute(kind, decode_publish).await
    }

    /// Publish the same data into several channels
    pub async fn broadcast<I, T>(&self, channels: I, data: &T) -> Result<bool, ApiError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        T: Serialize + ?Sized,
    {
        let kind = CommandKind::Broadcast {
            channels: to_channels(channels),
            data: encode(data)?,
            client: None,
        };
        self.execute(kind, decode_broadcast).await
    }

    pub async fn broadcast_client<I, T>(
        &self,
        channels: I,
        data: &T,
        client: &str,
    ) -> Result<bool, ApiError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        T: Serialize + ?Sized,
    {
        let kind = CommandKind::Broadcast {
            channels: to_channels(channels),
            data: encode(data)?,
            client: Some(client.to_string()),
        };
        self.execute(kind, decode_broadcast).await
    }

    /// Unsubscribe a user from a channel
    pub async fn unsubscribe(&self, channel: &str, user: &str) -> Result<bool, ApiError> {
        let kind = CommandKind::Unsubscribe {
            channel: channel.to_string(),
            user: user.to_string(),
        };
        self.execute(kind, decode_unsubscribe).await
    }

    /// Disconnect every connection of a user
    pub async fn disconnect(&self, user: &str) -> Result<bool, ApiError> {
        let kind = CommandKind::Disconnect {
            user: user.to_string(),
        };
        self.execute(kind, decode_disconnect).await
    }

    /// Clients subscribed to a channel, keyed by connection ID
    pub async fn presence(&self, channel: &str) -> Result<HashMap<String, ClientInfo>, ApiError> {
        let kind = CommandKind::Presence {
            channel: channel.to_string(),
        };
        self.execute(kind, decode_presence).await
    }

    pub async fn history(&self, channel: &str) -> Result<Vec<Message>, ApiError> {
        let kind = CommandKind::History {
            channel: channel.to_string(),
        };
        self.execute(kind, decode_history).await
    }

    /// Channels with one or more subscribers
    pub async fn channels(&self) -> Result<Vec<String>, ApiError> {
        self.execute(CommandKind::Channels {}, decode_channels).await
    }

    pub async fn stats(&self) -> Result<Stats, ApiError> {
        self.execute(CommandKind::Stats {}, decode_stats).await
    }
}
