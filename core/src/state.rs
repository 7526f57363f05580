//! The panel's state tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{KeyValue, MasterObject, PresetState, UrlState};

pub const DEFAULT_METHOD: &str = "GET";

/// Everything the panel renders from. Mutated only through
/// `reducer::reduce` and `reducer::complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelState {
    #[serde(rename = "urlState")]
    pub url: UrlState,
    #[serde(rename = "methodState")]
    pub method: String,
    #[serde(rename = "headerState")]
    pub headers: Vec<KeyValue>,
    #[serde(rename = "cookieState")]
    pub cookies: Vec<KeyValue>,
    #[serde(rename = "dataState")]
    pub body: String,
    #[serde(rename = "paramState")]
    pub path_params: BTreeMap<String, String>,
    #[serde(rename = "presetState")]
    pub preset: PresetState,
    pub loading: bool,
    pub waiting: bool,
    pub valid_port: bool,
    pub request_result: Option<Value>,
    pub master_object: MasterObject,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            url: UrlState::Default,
            method: DEFAULT_METHOD.to_string(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: String::new(),
            path_params: BTreeMap::new(),
            preset: PresetState::Default,
            // Discovery runs at startup.
            loading: true,
            waiting: false,
            valid_port: false,
            request_result: None,
            master_object: MasterObject::default(),
        }
    }
}

impl PanelState {
    /// Clear everything that belongs to one particular request: headers,
    /// cookies, body, path params and the current preset.
    pub fn reset_request_fields(&mut self) {
        self.headers.clear();
        self.cookies.clear();
        self.body.clear();
        self.path_params.clear();
        self.preset = PresetState::Default;
    }

    pub fn has_header(&self, key: &str) -> bool {
        self.headers.iter().any(|header| header.key == key)
    }
}
