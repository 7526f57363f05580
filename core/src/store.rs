//! Orchestrates state transitions and the calls they depend on.
//!
//! # Design
//! `Store` pairs the state tree with a `Bridge`. Local actions go through
//! `reducer::reduce` and the returned effects are performed here.
//! Asynchronous transitions update state, release the lock, await the
//! bridge, then fold the reply with `reducer::complete`. The lock is never
//! held across an await, so other actions and other in-flight calls keep
//! going while one call waits.
//!
//! A reply that lands after the panel moved on is still folded in; there
//! is no cancellation.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bridge::Bridge;
use crate::builder;
use crate::error::StoreError;
use crate::protocol::{Command, CommandKind, CommandReply, Payload};
use crate::reducer::{self, Action, Completion, Effect};
use crate::state::PanelState;
use crate::types::{Catalog, MasterObject, Preset, PresetDraft, SavedPreset};

#[derive(Clone)]
pub struct Store {
    state: Arc<Mutex<PanelState>>,
    bridge: Bridge,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("bridge", &self.bridge).finish()
    }
}

impl Store {
    pub fn new(bridge: Bridge) -> Self {
        Self::with_state(bridge, PanelState::default())
    }

    pub fn with_state(bridge: Bridge, state: PanelState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            bridge,
        }
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> PanelState {
        self.lock().clone()
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// Apply a local action and perform its effects.
    pub fn dispatch(&self, action: Action) {
        let effects = reducer::reduce(&mut self.lock(), action);
        for effect in effects {
            self.perform(effect);
        }
    }

    /// Ask the host to open a terminal. Nothing comes back.
    pub fn open_terminal(&self) {
        if let Err(err) = self.bridge.notify(Payload::bare(Command::OpenTerminal)) {
            tracing::warn!(%err, "could not request terminal");
        }
    }

    /// Startup discovery. A catalog without domains (or with
    /// `phase: "pending"`) only updates server metadata and keeps `loading`.
    pub async fn get_master_object(&self) -> Result<(), StoreError> {
        let data = self.call(Payload::bare(Command::DataObjects)).await?;
        let catalog = Catalog::from_value(data).map_err(decode_error)?;
        if let Catalog::Partial { .. } = &catalog {
            tracing::debug!("catalog still pending discovery");
        }
        self.complete(Completion::Catalog(catalog));
        Ok(())
    }

    /// Send any `{command, data}` and fold the reply generically.
    /// Fire-and-forget commands are sent without waiting for a reply.
    pub async fn vsc_api(&self, payload: Payload) -> Result<(), StoreError> {
        let command = payload.command.parse::<Command>();
        if let Ok(known) = command {
            if known.kind() == CommandKind::FireAndForget {
                self.bridge.notify(payload)?;
                return Ok(());
            }
        }

        let deleted_id = payload.data.as_ref().and_then(preset_ref_id);
        let data = self.call(payload).await?;

        let completion = match command {
            Ok(Command::WipeStorageObject) => Completion::StorageWiped,
            Ok(Command::DeletePreset) => Completion::PresetDeleted {
                id: deleted_id,
                master_object: decode(data)?,
            },
            _ => Completion::MasterObjectReplaced(decode(data)?),
        };
        self.complete(completion);
        Ok(())
    }

    /// Clear the host's stored catalog and presets. The panel goes back to
    /// `loading` until the next discovery answer arrives.
    pub async fn wipe_storage_object(&self) -> Result<(), StoreError> {
        self.dispatch(Action::SetLoading(true));
        self.call(Payload::bare(Command::WipeStorageObject)).await?;
        self.complete(Completion::StorageWiped);
        Ok(())
    }

    pub async fn validate_port(&self, port: u16) -> Result<(), StoreError> {
        let data = self
            .call(Payload::new(Command::ValidatePort, Some(Value::from(port))))
            .await?;
        let valid = data
            .as_bool()
            .ok_or_else(|| StoreError::Decode(format!("expected boolean, got {data}")))?;
        self.complete(Completion::PortValidated(valid));
        Ok(())
    }

    /// Persist the current headers, cookies and body as a named preset of
    /// the selected url.
    pub async fn save_preset(&self, name: &str) -> Result<(), StoreError> {
        let draft = {
            let state = self.lock();
            let url = state
                .url
                .selected()
                .ok_or(StoreError::NoUrlSelected)?;
            PresetDraft {
                name: name.to_string(),
                url_state: url.clone(),
                header_state: state.headers.clone(),
                cookie_state: state.cookies.clone(),
                data_state: state.body.clone(),
            }
        };
        let draft = serde_json::to_value(&draft).map_err(|e| StoreError::Encode(e.to_string()))?;

        let reply = self
            .call_with_reply(Payload::new(Command::SavePreset, Some(draft)))
            .await?;
        let preset: Preset = decode(
            reply
                .preset
                .ok_or_else(|| StoreError::Decode("savePreset reply has no preset".to_string()))?,
        )?;
        let data: MasterObject = decode(reply.data)?;
        self.complete(Completion::PresetSaved(SavedPreset { data, preset }));
        Ok(())
    }

    /// Build the request from current state and have the host execute it.
    /// With no url selected nothing is sent. `waiting` is cleared whether
    /// the call resolves or rejects; a rejection is returned to the caller.
    pub async fn make_request(&self) -> Result<(), StoreError> {
        let descriptor = {
            let mut state = self.lock();
            state.waiting = true;
            let Some(descriptor) = builder::build(&state) else {
                state.waiting = false;
                tracing::debug!("make_request with no url selected; skipped");
                return Ok(());
            };
            match serde_json::to_value(&descriptor) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    state.waiting = false;
                    return Err(StoreError::Encode(err.to_string()));
                }
            }
        };

        match self
            .call(Payload::new(Command::MakeRequest, Some(descriptor)))
            .await
        {
            Ok(result) => {
                self.complete(Completion::RequestFinished(Some(result)));
                Ok(())
            }
            Err(err) => {
                self.complete(Completion::RequestFinished(None));
                Err(err)
            }
        }
    }

    /// Issue a correlated call and unwrap the reply's inner `data`.
    async fn call(&self, payload: Payload) -> Result<Value, StoreError> {
        Ok(self.call_with_reply(payload).await?.data)
    }

    async fn call_with_reply(&self, payload: Payload) -> Result<CommandReply, StoreError> {
        let command = payload.command.clone();
        let data = self.bridge.call(payload).await.inspect_err(|err| {
            tracing::debug!(%command, %err, "call failed");
        })?;
        decode(data)
    }

    fn complete(&self, completion: Completion) {
        reducer::complete(&mut self.lock(), completion);
    }

    fn perform(&self, effect: Effect) {
        match effect {
            Effect::OpenFileInEditor(path) => {
                let payload = Payload::new(Command::OpenFileInEditor, Some(Value::from(path)));
                if let Err(err) = self.bridge.notify(payload) {
                    tracing::warn!(%err, "could not request editor open");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A preset may be referenced by its id or by the preset object itself.
fn preset_ref_id(data: &Value) -> Option<String> {
    match data {
        Value::String(id) => Some(id.clone()),
        Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(decode_error)
}

fn decode_error(err: serde_json::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}
