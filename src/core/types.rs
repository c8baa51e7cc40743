use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// Parameters of one API call, one variant per server method.
///
/// Serialized untagged: the variant only contributes the `params` object,
/// the method name travels next to it in [`Command`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandKind {
    Publish {
        channel: String,
        data: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        client: Option<String>,
    },
    Broadcast {
        channels: Vec<String>,
        data: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        client: Option<String>,
    },
    Unsubscribe {
        channel: String,
        user: String,
    },
    Disconnect {
        user: String,
    },
    Presence {
        channel: String,
    },
    History {
        channel: String,
    },
    Channels {},
    Stats {},
}

impl CommandKind {
    /// Wire name of the server method
    pub const fn method(&self) -> &'static str {
        match self {
            Self::Publish { .. } => "publish",
            Self::Broadcast { .. } => "broadcast",
            Self::Unsubscribe { .. } => "unsubscribe",
            Self::Disconnect { .. } => "disconnect",
            Self::Presence { .. } => "presence",
            Self::History { .. } => "history",
            Self::Channels {} => "channels",
            Self::Stats {} => "stats",
        }
    }
}

/// A buffered API call. The uid is assigned when the command enters the
/// buffer and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    uid: String,
    kind: CommandKind,
}

impl Command {
    pub(crate) fn new(uid: String, kind: CommandKind) -> Self {
        Self { uid, kind }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn method(&self) -> &'static str {
        self.kind.method()
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn into_kind(self) -> CommandKind {
        self.kind
    }
}

impl Serialize for Command {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Command", 3)?;
        state.serialize_field("uid", &self.uid)?;
        state.serialize_field("method", self.kind.method())?;
        state.serialize_field("params", &self.kind)?;
        state.end()
    }
}

/// Server reply to one command, positionally aligned with the request batch
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandResult {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub body: Value,
}

impl CommandResult {
    /// The command's own error, with empty strings treated as success
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    pub fn is_ok(&self) -> bool {
        self.error_message().is_none()
    }
}

/// Connection information of a subscribed client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub client: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_info: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_info: Option<Value>,
}

/// A message stored in channel history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub uid: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ClientInfo>,
    pub channel: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub started_at: i64,
    #[serde(default)]
    pub metrics: HashMap<String, i64>,
}

/// Server-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
    #[serde(default)]
    pub metrics_interval: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_format() {
        let cmd = Command::new(
            "uid-1".to_string(),
            CommandKind::Publish {
                channel: "$public:chat".to_string(),
                data: json!({"input": "test"}),
                client: None,
            },
        );
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({
                "uid": "uid-1",
                "method": "publish",
                "params": {"channel": "$public:chat", "data": {"input": "test"}}
            })
        );
    }

    #[test]
    fn test_client_param_is_included_when_set() {
        let cmd = Command::new(
            "uid-2".to_string(),
            CommandKind::Broadcast {
                channels: vec!["a".to_string(), "b".to_string()],
                data: json!(1),
                client: Some("client-id".to_string()),
            },
        );
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(value["method"], "broadcast");
        assert_eq!(value["params"]["channels"], json!(["a", "b"]));
        assert_eq!(value["params"]["client"], "client-id");
    }

    #[test]
    fn test_parameterless_commands_send_empty_params() {
        for kind in [CommandKind::Channels {}, CommandKind::Stats {}] {
            let method = kind.method();
            let value = serde_json::to_value(Command::new("u".to_string(), kind)).unwrap();
            assert_eq!(value["method"], method);
            assert_eq!(value["params"], json!({}));
        }
    }

    #[test]
    fn test_command_result_error_message() {
        let results: Vec<CommandResult> = serde_json::from_value(json!([
            {"body": {}},
            {"error": "", "body": null},
            {"method": "publish", "error": "namespace not found"}
        ]))
        .unwrap();

        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert_eq!(results[2].error_message(), Some("namespace not found"));
        assert_eq!(results[2].body, Value::Null);
    }

    #[test]
    fn test_message_tolerates_missing_optional_fields() {
        let msg: Message = serde_json::from_value(json!({
            "uid": "m1",
            "channel": "news",
            "data": {"text": "hi"}
        }))
        .unwrap();
        assert_eq!(msg.uid, "m1");
        assert!(msg.info.is_none());
        assert!(msg.client.is_none());
        assert!(msg.timestamp.is_empty());
    }
}
