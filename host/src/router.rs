//! Dispatches inbound envelopes to host operations.
//!
//! # Design
//! The command table is built once from `Command::ALL`. Each entry is
//! tagged `Correlated` or `FireAndForget`, so whether a reply goes out is a
//! property of the command, not of which match arm happens to send one.
//! Unknown command names get no reply at all.

use std::collections::HashMap;
use std::sync::Arc;

use reqpanel_core::{Command, CommandKind, CommandReply, InboundEnvelope, OutboundEnvelope};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::HostError;
use crate::ops::HostOperations;

/// A command table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Correlated(Command),
    FireAndForget(Command),
}

impl Route {
    fn for_command(command: Command) -> Self {
        match command.kind() {
            CommandKind::Correlated => Route::Correlated(command),
            CommandKind::FireAndForget => Route::FireAndForget(command),
        }
    }
}

pub struct CommandRouter<H> {
    ops: Arc<H>,
    table: HashMap<&'static str, Route>,
}

impl<H> std::fmt::Debug for CommandRouter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRouter")
            .field("commands", &self.table.len())
            .finish()
    }
}

impl<H: HostOperations> CommandRouter<H> {
    pub fn new(ops: H) -> Self {
        Self::with_shared(Arc::new(ops))
    }

    pub fn with_shared(ops: Arc<H>) -> Self {
        let table = Command::ALL
            .into_iter()
            .map(|command| (command.as_str(), Route::for_command(command)))
            .collect();
        Self { ops, table }
    }

    pub fn ops(&self) -> &H {
        &self.ops
    }

    pub fn route(&self, name: &str) -> Option<Route> {
        self.table.get(name).copied()
    }

    /// Run the envelope's command. Returns the reply to send, if any.
    pub async fn dispatch(&self, envelope: OutboundEnvelope) -> Option<InboundEnvelope> {
        let OutboundEnvelope { req_id, payload } = envelope;
        let name = payload.command;

        let Some(route) = self.route(&name) else {
            tracing::warn!(req_id = %req_id, command = %name, "ignoring unknown command");
            return None;
        };

        match route {
            Route::FireAndForget(command) => {
                if let Err(err) = self.run_fire_and_forget(command, payload.data).await {
                    tracing::warn!(command = %command, %err, "fire-and-forget command failed");
                }
                None
            }
            Route::Correlated(command) => {
                let reply = match self.run_correlated(command, payload.data).await {
                    Ok(reply) => serde_json::to_value(reply)
                        .map(|data| InboundEnvelope::resolved(req_id.clone(), data))
                        .unwrap_or_else(|err| {
                            InboundEnvelope::rejected(
                                req_id.clone(),
                                HostError::from(err).to_payload(command.as_str()),
                            )
                        }),
                    Err(err) => {
                        tracing::debug!(req_id = %req_id, command = %command, %err, "command failed");
                        InboundEnvelope::rejected(req_id.clone(), err.to_payload(command.as_str()))
                    }
                };
                Some(reply)
            }
        }
    }

    async fn run_correlated(
        &self,
        command: Command,
        data: Option<Value>,
    ) -> Result<CommandReply, HostError> {
        let reply = |data: Value| CommandReply {
            command: command.as_str().to_string(),
            data,
            preset: None,
        };

        match command {
            Command::DataObjects => Ok(reply(self.ops.data_objects().await?)),
            Command::ParseServer => {
                let root: String = input(command, data)?;
                Ok(reply(serde_json::to_value(self.ops.parse_server(root).await?)?))
            }
            Command::DeletePreset => {
                let preset_ref = data.ok_or_else(|| missing_input(command))?;
                Ok(reply(serde_json::to_value(self.ops.delete_preset(preset_ref).await?)?))
            }
            Command::WipeStorageObject => {
                self.ops.wipe_storage_object().await?;
                Ok(reply(Value::Null))
            }
            Command::SavePreset => {
                let saved = self.ops.save_preset(input(command, data)?).await?;
                Ok(CommandReply {
                    preset: Some(serde_json::to_value(&saved.preset)?),
                    ..reply(serde_json::to_value(&saved.data)?)
                })
            }
            Command::ValidatePort => {
                let port: u16 = input(command, data)?;
                Ok(reply(Value::Bool(self.ops.validate_port(port).await?)))
            }
            Command::MakeRequest => {
                let response = self.ops.make_request(input(command, data)?).await?;
                Ok(reply(serde_json::to_value(response)?))
            }
            Command::OpenTerminal | Command::OpenFileInEditor => {
                self.run_fire_and_forget(command, data).await?;
                Ok(reply(Value::Null))
            }
        }
    }

    async fn run_fire_and_forget(
        &self,
        command: Command,
        data: Option<Value>,
    ) -> Result<(), HostError> {
        match command {
            Command::OpenTerminal => self.ops.open_terminal().await,
            Command::OpenFileInEditor => {
                let path: String = input(command, data)?;
                self.ops.open_file_in_editor(path).await
            }
            other => Err(HostError::InvalidInput {
                command: other.as_str().to_string(),
                message: "command expects a reply".to_string(),
            }),
        }
    }
}

fn input<T: DeserializeOwned>(command: Command, data: Option<Value>) -> Result<T, HostError> {
    let data = data.ok_or_else(|| missing_input(command))?;
    serde_json::from_value(data).map_err(|err| HostError::InvalidInput {
        command: command.as_str().to_string(),
        message: err.to_string(),
    })
}

fn missing_input(command: Command) -> HostError {
    HostError::InvalidInput {
        command: command.as_str().to_string(),
        message: "missing data".to_string(),
    }
}
