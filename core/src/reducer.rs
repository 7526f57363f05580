//! State transitions for the panel.
//!
//! `reduce` handles local edits and returns the side effects the caller
//! must perform. `complete` folds a host reply into state once an
//! asynchronous transition's call has settled. Neither function suspends
//! or talks to the bridge.

use serde_json::Value;

use crate::builder::path_placeholders;
use crate::state::PanelState;
use crate::types::{
    Catalog, KeyValue, MasterObject, PresetState, SavedPreset, Selection, UrlState,
};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_MIME: &str = "application/json";

/// A synchronous, local edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetUrlState(UrlState),
    SetMethodState(String),
    SetHeaderState(Vec<KeyValue>),
    SetCookieState(Vec<KeyValue>),
    SetParamState { name: String, value: String },
    SetDataState(String),
    SetCurrentPreset(PresetState),
    SetLoading(bool),
    SetWaiting(bool),
    SetValidPort(bool),
    SetMasterObject(MasterObject),
}

/// Work a transition asks the orchestrator to do on its behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    OpenFileInEditor(String),
}

/// The settled result of an asynchronous transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Catalog(Catalog),
    MasterObjectReplaced(MasterObject),
    PresetDeleted {
        id: Option<String>,
        master_object: MasterObject,
    },
    StorageWiped,
    PortValidated(bool),
    PresetSaved(SavedPreset),
    /// `None` when the call was rejected; `waiting` is cleared regardless.
    RequestFinished(Option<Value>),
}

pub fn reduce(state: &mut PanelState, action: Action) -> Vec<Effect> {
    match action {
        Action::SetUrlState(url) => {
            let effects = match &url {
                Selection::Default => Vec::new(),
                Selection::Selected(descriptor) => {
                    state.reset_request_fields();
                    vec![Effect::OpenFileInEditor(descriptor.file_path.clone())]
                }
            };
            state.url = url;
            effects
        }
        Action::SetMethodState(method) => {
            state.method = method;
            Vec::new()
        }
        Action::SetHeaderState(headers) => {
            state.headers = headers;
            Vec::new()
        }
        Action::SetCookieState(cookies) => {
            state.cookies = cookies;
            Vec::new()
        }
        Action::SetParamState { name, value } => {
            set_param(state, name, value);
            Vec::new()
        }
        Action::SetDataState(body) => {
            if !body.is_empty() && !state.has_header(CONTENT_TYPE) {
                state.headers.insert(0, KeyValue::new(CONTENT_TYPE, JSON_MIME));
            }
            state.body = body;
            Vec::new()
        }
        Action::SetCurrentPreset(preset) => {
            match preset {
                Selection::Default => state.reset_request_fields(),
                Selection::Selected(preset) => {
                    state.headers = preset.header_state.clone();
                    state.cookies = preset.cookie_state.clone();
                    state.body = preset.data_state.clone();
                    state.preset = Selection::Selected(preset);
                }
            }
            Vec::new()
        }
        Action::SetLoading(loading) => {
            state.loading = loading;
            Vec::new()
        }
        Action::SetWaiting(waiting) => {
            state.waiting = waiting;
            Vec::new()
        }
        Action::SetValidPort(valid) => {
            state.valid_port = valid;
            Vec::new()
        }
        Action::SetMasterObject(master) => {
            state.master_object = master;
            Vec::new()
        }
    }
}

/// Path params may only name placeholders of the selected url.
fn set_param(state: &mut PanelState, name: String, value: String) {
    let Some(url) = state.url.selected() else {
        tracing::debug!(%name, "ignoring path param with no url selected");
        return;
    };
    if !path_placeholders(&url.href).contains(&name) {
        tracing::debug!(%name, href = %url.href, "ignoring path param not in url template");
        return;
    }
    state.path_params.insert(name, value);
}

pub fn complete(state: &mut PanelState, completion: Completion) {
    match completion {
        Completion::Catalog(Catalog::Partial {
            server_paths,
            root_directory,
        }) => {
            state.master_object.server_paths = server_paths;
            state.master_object.root_directory = root_directory;
            state.loading = true;
        }
        Completion::Catalog(Catalog::Complete(master))
        | Completion::MasterObjectReplaced(master) => {
            state.master_object = master;
            state.loading = false;
        }
        Completion::PresetDeleted { id, master_object } => {
            state.master_object = master_object;
            state.preset = PresetState::Default;
            if let (Some(id), Some(url)) = (id, state.url.selected_mut()) {
                url.presets.remove(&id);
            }
        }
        Completion::StorageWiped => {}
        Completion::PortValidated(valid) => state.valid_port = valid,
        Completion::PresetSaved(SavedPreset { data, preset }) => {
            state.master_object = data;
            if let Some(url) = state.url.selected_mut() {
                url.presets.insert(preset.id.clone(), preset.clone());
            }
            state.preset = Selection::Selected(preset);
        }
        Completion::RequestFinished(result) => {
            if let Some(result) = result {
                state.request_result = Some(result);
            }
            state.waiting = false;
        }
    }
}
