//! The privileged operations a host provides.

use async_trait::async_trait;
use reqpanel_core::{HttpResponse, MasterObject, PresetDraft, RequestDescriptor, SavedPreset};
use serde_json::Value;

use crate::error::HostError;

/// One method per command in the catalog. The router decodes envelope
/// input into these argument types and encodes the results back.
#[async_trait]
pub trait HostOperations: Send + Sync + 'static {
    /// The stored catalog, or a partial one (`serverPaths`,
    /// `rootDirectory`) while discovery has not run.
    async fn data_objects(&self) -> Result<Value, HostError>;

    /// Scan server source under `root` and rebuild the catalog.
    async fn parse_server(&self, root: String) -> Result<MasterObject, HostError>;

    /// `preset_ref` is a preset id or a preset object carrying `id`.
    async fn delete_preset(&self, preset_ref: Value) -> Result<MasterObject, HostError>;

    async fn wipe_storage_object(&self) -> Result<(), HostError>;

    async fn save_preset(&self, draft: PresetDraft) -> Result<SavedPreset, HostError>;

    /// Whether something is accepting connections on the port.
    async fn validate_port(&self, port: u16) -> Result<bool, HostError>;

    async fn make_request(&self, request: RequestDescriptor) -> Result<HttpResponse, HostError>;

    async fn open_terminal(&self) -> Result<(), HostError>;

    async fn open_file_in_editor(&self, path: String) -> Result<(), HostError>;
}
