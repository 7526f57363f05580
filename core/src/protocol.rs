//! Envelope types exchanged between the panel and the privileged host.
//!
//! # Design
//! The transport carries no request/response pairing of its own, so every
//! outbound envelope carries a `reqId` and every reply echoes it back. The
//! command name stays a plain string on the wire: a host must be able to
//! receive (and ignore) names it does not know, so parsing into `Command`
//! happens at the edges rather than during deserialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Panel → host message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEnvelope {
    pub req_id: String,
    pub payload: Payload,
}

/// The command a panel asks the host to run, with its optional input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Payload {
    pub fn new(command: Command, data: Option<Value>) -> Self {
        Self {
            command: command.as_str().to_string(),
            data,
        }
    }

    /// A payload for a command that takes no input.
    pub fn bare(command: Command) -> Self {
        Self::new(command, None)
    }
}

/// Host → panel message. Exactly one of `data` / `err` is expected; when
/// `data` is absent the reply counts as a rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEnvelope {
    pub req_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<Value>,
}

impl InboundEnvelope {
    pub fn resolved(req_id: impl Into<String>, data: Value) -> Self {
        Self {
            req_id: req_id.into(),
            data: Some(data),
            err: None,
        }
    }

    pub fn rejected(req_id: impl Into<String>, err: Value) -> Self {
        Self {
            req_id: req_id.into(),
            data: None,
            err: Some(err),
        }
    }

    /// Split the reply into the value a pending call settles with.
    pub fn into_outcome(self) -> Result<Value, Value> {
        match self.data {
            Some(data) => Ok(data),
            None => Err(self.err.unwrap_or(Value::Null)),
        }
    }
}

/// Body of a successful correlated reply: `{command, data, preset?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandReply {
    pub command: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<Value>,
}

/// Whether the host answers a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// The host replies with the same `reqId`.
    Correlated,
    /// The host runs the operation and sends nothing back.
    FireAndForget,
}

/// Every privileged operation the host knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    DataObjects,
    ParseServer,
    DeletePreset,
    WipeStorageObject,
    SavePreset,
    ValidatePort,
    MakeRequest,
    OpenTerminal,
    OpenFileInEditor,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::DataObjects,
        Command::ParseServer,
        Command::DeletePreset,
        Command::WipeStorageObject,
        Command::SavePreset,
        Command::ValidatePort,
        Command::MakeRequest,
        Command::OpenTerminal,
        Command::OpenFileInEditor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Command::DataObjects => "dataObjects",
            Command::ParseServer => "parseServer",
            Command::DeletePreset => "deletePreset",
            Command::WipeStorageObject => "wipeStorageObject",
            Command::SavePreset => "savePreset",
            Command::ValidatePort => "validatePort",
            Command::MakeRequest => "makeRequest",
            Command::OpenTerminal => "openTerminal",
            Command::OpenFileInEditor => "openFileInEditor",
        }
    }

    pub fn kind(self) -> CommandKind {
        match self {
            Command::OpenTerminal | Command::OpenFileInEditor => CommandKind::FireAndForget,
            _ => CommandKind::Correlated,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a command name is not in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command: {}", self.0)
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outbound_uses_camel_case_req_id() {
        let envelope = OutboundEnvelope {
            req_id: "r1".to_string(),
            payload: Payload::new(Command::ParseServer, Some(json!("/srv"))),
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["reqId"], "r1");
        assert_eq!(value["payload"]["command"], "parseServer");
        assert_eq!(value["payload"]["data"], "/srv");
    }

    #[test]
    fn bare_payload_omits_data() {
        let value = serde_json::to_value(Payload::bare(Command::DataObjects)).unwrap();
        assert!(value.get("data").is_none());
    }

    #[test]
    fn inbound_without_data_is_a_rejection() {
        let envelope: InboundEnvelope =
            serde_json::from_str(r#"{"reqId":"r1","err":{"message":"boom"}}"#).unwrap();
        assert_eq!(envelope.into_outcome(), Err(json!({"message": "boom"})));
    }

    #[test]
    fn inbound_without_data_or_err_rejects_with_null() {
        let envelope: InboundEnvelope = serde_json::from_str(r#"{"reqId":"r1"}"#).unwrap();
        assert_eq!(envelope.into_outcome(), Err(Value::Null));
    }

    #[test]
    fn command_names_round_trip_through_from_str() {
        for command in Command::ALL {
            assert_eq!(command.as_str().parse::<Command>(), Ok(command));
        }
        assert!("launchMissiles".parse::<Command>().is_err());
    }

    #[test]
    fn only_terminal_and_editor_are_fire_and_forget() {
        let fire_and_forget: Vec<_> = Command::ALL
            .into_iter()
            .filter(|c| c.kind() == CommandKind::FireAndForget)
            .collect();
        assert_eq!(
            fire_and_forget,
            vec![Command::OpenTerminal, Command::OpenFileInEditor]
        );
    }
}
