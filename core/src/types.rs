//! Domain types shared by the panel and the host.
//!
//! # Design
//! Field names follow the wire format (`filePath`, `headerState`,
//! `serverPaths`, …). Url and preset selections are either the string
//! `"default"` or a full object, modelled by `Selection<T>`. Unknown fields
//! on urls and presets are kept in `extra` so a round trip through the
//! panel does not strip what the host put there.

use std::collections::BTreeMap;

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_SENTINEL: &str = "default";

/// One row of the header or cookie editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Rows with an empty key or value never reach the outbound request.
    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && !self.value.is_empty()
    }
}

/// Either nothing selected (`"default"` on the wire) or a concrete value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Selection<T> {
    #[default]
    Default,
    Selected(T),
}

impl<T> Selection<T> {
    pub fn is_default(&self) -> bool {
        matches!(self, Selection::Default)
    }

    pub fn selected(&self) -> Option<&T> {
        match self {
            Selection::Default => None,
            Selection::Selected(value) => Some(value),
        }
    }

    pub fn selected_mut(&mut self) -> Option<&mut T> {
        match self {
            Selection::Default => None,
            Selection::Selected(value) => Some(value),
        }
    }
}

impl<T: Serialize> Serialize for Selection<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::Default => serializer.serialize_str(DEFAULT_SENTINEL),
            Selection::Selected(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Selection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(Selection::Default),
            Value::String(s) if s == DEFAULT_SENTINEL => Ok(Selection::Default),
            other => serde_json::from_value(other)
                .map(Selection::Selected)
                .map_err(D::Error::custom),
        }
    }
}

pub type UrlState = Selection<UrlDescriptor>;
pub type PresetState = Selection<Preset>;

/// A discovered endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlDescriptor {
    #[serde(default)]
    pub id: String,
    pub file_path: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub presets: BTreeMap<String, Preset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A saved header/cookie/body snapshot for one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub header_state: Vec<KeyValue>,
    #[serde(default)]
    pub cookie_state: Vec<KeyValue>,
    #[serde(default)]
    pub data_state: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What the panel sends to have a preset persisted. The host assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDraft {
    pub name: String,
    pub url_state: UrlDescriptor,
    pub header_state: Vec<KeyValue>,
    pub cookie_state: Vec<KeyValue>,
    pub data_state: String,
}

/// Host answer to `savePreset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPreset {
    pub data: MasterObject,
    pub preset: Preset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryPhase {
    #[default]
    Pending,
    Complete,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(default)]
    pub urls: BTreeMap<String, UrlDescriptor>,
}

/// Catalog of discovered endpoints plus server metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterObject {
    #[serde(default)]
    pub domains: BTreeMap<String, Domain>,
    #[serde(default)]
    pub server_paths: Vec<String>,
    #[serde(default)]
    pub root_directory: String,
    #[serde(default)]
    pub phase: DiscoveryPhase,
}

impl MasterObject {
    /// Find a url by id across all domains.
    pub fn url(&self, id: &str) -> Option<&UrlDescriptor> {
        self.domains.values().find_map(|domain| domain.urls.get(id))
    }

    pub fn url_mut(&mut self, id: &str) -> Option<&mut UrlDescriptor> {
        self.domains
            .values_mut()
            .find_map(|domain| domain.urls.get_mut(id))
    }
}

/// A `dataObjects` answer, classified by discovery phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Catalog {
    /// Discovery has not finished; only server metadata is known.
    Partial {
        server_paths: Vec<String>,
        root_directory: String,
    },
    Complete(MasterObject),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialCatalog {
    #[serde(default)]
    server_paths: Vec<String>,
    #[serde(default)]
    root_directory: String,
}

impl Catalog {
    /// An explicit `phase` field decides; without one, a catalog lacking
    /// `domains` is still pending.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let complete = match value.get("phase").and_then(Value::as_str) {
            Some("pending") => false,
            Some(_) => true,
            None => value.get("domains").is_some(),
        };

        if complete {
            let mut master: MasterObject = serde_json::from_value(value)?;
            master.phase = DiscoveryPhase::Complete;
            return Ok(Catalog::Complete(master));
        }

        let partial: PartialCatalog = serde_json::from_value(value)?;
        Ok(Catalog::Partial {
            server_paths: partial.server_paths,
            root_directory: partial.root_directory,
        })
    }
}
