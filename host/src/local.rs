//! The bundled host: filesystem discovery, a catalog store, ureq for
//! outbound requests and spawned processes for the editor and terminal.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use reqpanel_core::{HttpResponse, MasterObject, Preset, PresetDraft, RequestDescriptor, SavedPreset};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::HostConfig;
use crate::discovery;
use crate::error::HostError;
use crate::http_exec;
use crate::ops::HostOperations;
use crate::storage::CatalogStore;

const PORT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct LocalHost {
    config: HostConfig,
    store: Mutex<CatalogStore>,
}

impl LocalHost {
    pub async fn open(config: HostConfig) -> Result<Self, HostError> {
        let store = CatalogStore::open(config.storage_path.clone()).await?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: HostConfig, store: CatalogStore) -> Self {
        Self {
            config,
            store: Mutex::new(store),
        }
    }

    fn root_or_default(&self, root: String) -> PathBuf {
        if root.trim().is_empty() {
            self.config.root.clone()
        } else {
            PathBuf::from(root)
        }
    }
}

#[async_trait]
impl HostOperations for LocalHost {
    async fn data_objects(&self) -> Result<Value, HostError> {
        if let Some(catalog) = self.store.lock().await.catalog() {
            return Ok(serde_json::to_value(catalog)?);
        }
        let root = self.config.root.clone();
        Ok(blocking(move || discovery::partial_catalog(&root)).await?)
    }

    async fn parse_server(&self, root: String) -> Result<MasterObject, HostError> {
        let root = self.root_or_default(root);
        let port = self.config.server_port;
        tracing::info!(root = %root.display(), "scanning server source");
        let mut catalog = blocking(move || discovery::build_catalog(&root, port)).await?;

        let mut store = self.store.lock().await;
        if let Some(previous) = store.catalog() {
            discovery::carry_presets(previous, &mut catalog);
        }
        store.replace(catalog.clone()).await?;
        Ok(catalog)
    }

    async fn delete_preset(&self, preset_ref: Value) -> Result<MasterObject, HostError> {
        let id = match &preset_ref {
            Value::String(id) => id.clone(),
            Value::Object(map) => map
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| invalid_preset_ref(&preset_ref))?,
            _ => return Err(invalid_preset_ref(&preset_ref)),
        };

        self.store
            .lock()
            .await
            .update(|catalog| {
                let mut removed = false;
                for url in catalog.domains.values_mut().flat_map(|d| d.urls.values_mut()) {
                    removed |= url.presets.remove(&id).is_some();
                }
                if !removed {
                    tracing::debug!(%id, "preset to delete was not stored");
                }
                Ok(catalog.clone())
            })
            .await
    }

    async fn wipe_storage_object(&self) -> Result<(), HostError> {
        tracing::info!("wiping stored catalog");
        self.store.lock().await.wipe().await
    }

    async fn save_preset(&self, draft: PresetDraft) -> Result<SavedPreset, HostError> {
        let preset = Preset {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            header_state: draft.header_state,
            cookie_state: draft.cookie_state,
            data_state: draft.data_state,
            ..Preset::default()
        };
        let url_id = draft.url_state.id;

        self.store
            .lock()
            .await
            .update(|catalog| {
                let url = catalog
                    .url_mut(&url_id)
                    .ok_or_else(|| HostError::NotFound(format!("url `{url_id}`")))?;
                url.presets.insert(preset.id.clone(), preset.clone());
                Ok(SavedPreset {
                    data: catalog.clone(),
                    preset,
                })
            })
            .await
    }

    async fn validate_port(&self, port: u16) -> Result<bool, HostError> {
        if port == 0 {
            return Ok(false);
        }
        let probe = tokio::time::timeout(PORT_PROBE_TIMEOUT, TcpStream::connect(("127.0.0.1", port)));
        Ok(matches!(probe.await, Ok(Ok(_))))
    }

    async fn make_request(&self, request: RequestDescriptor) -> Result<HttpResponse, HostError> {
        let timeout = self.config.http_timeout;
        tracing::debug!(method = %request.method, url = %request.base_url, "executing request");
        let joined = tokio::task::spawn_blocking(move || http_exec::execute(&request, timeout)).await;
        joined.map_err(|err| HostError::Io(io::Error::other(err)))?
    }

    async fn open_terminal(&self) -> Result<(), HostError> {
        spawn_detached(&self.config.terminal_command, None)
    }

    async fn open_file_in_editor(&self, path: String) -> Result<(), HostError> {
        spawn_detached(&self.config.editor_command, Some(path))
    }
}

async fn blocking<T, F>(work: F) -> Result<T, HostError>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| HostError::Io(io::Error::other(err)))?
        .map_err(HostError::from)
}

/// `command` may carry its own arguments (`"code -r"`). The child gets no
/// stdin and no stdout: in the stdio binary stdout is the envelope stream.
/// Its stderr goes wherever the host logs.
fn spawn_detached(command: &str, arg: Option<String>) -> Result<(), HostError> {
    let mut parts = command.split_whitespace();
    let program = parts.next().ok_or_else(|| HostError::InvalidInput {
        command: "spawn".to_string(),
        message: "empty command".to_string(),
    })?;

    let mut process = Command::new(program);
    process
        .args(parts)
        .args(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null());
    process.spawn().map_err(|source| HostError::Launch {
        program: program.to_string(),
        source,
    })?;
    Ok(())
}

fn invalid_preset_ref(preset_ref: &Value) -> HostError {
    HostError::InvalidInput {
        command: "deletePreset".to_string(),
        message: format!("expected a preset id, got {preset_ref}"),
    }
}
