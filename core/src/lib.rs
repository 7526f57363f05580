//! Panel side of the request panel: correlation bridge, state store and
//! request builder.
//!
//! # Overview
//! The panel cannot touch the filesystem or the network. Everything
//! privileged is a named command sent to a host over a message channel;
//! the `Bridge` pairs each command with its reply. The `Store` keeps the
//! request being edited, runs local transitions through the reducer, and
//! issues bridged calls for the transitions that need the host. The
//! `builder` turns the finished state into a `RequestDescriptor` the host
//! executes.
//!
//! # Design
//! - Envelopes carry a generated `reqId`; replies are routed by id, never
//!   by arrival order.
//! - The reducer is pure and returns effects instead of sending messages.
//! - Calls can be time-boxed with `BridgeConfig::call_timeout`; without it
//!   a call whose reply never comes stays pending.

pub mod bridge;
pub mod builder;
pub mod channel;
pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod reducer;
pub mod state;
pub mod store;
pub mod types;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, StoreError};
pub use http::{HttpResponse, RequestDescriptor, RequestHeaders};
pub use protocol::{Command, CommandKind, CommandReply, InboundEnvelope, OutboundEnvelope, Payload};
pub use reducer::{Action, Completion, Effect};
pub use state::PanelState;
pub use store::Store;
pub use types::{
    Catalog, DiscoveryPhase, Domain, KeyValue, MasterObject, Preset, PresetDraft, PresetState,
    SavedPreset, Selection, UrlDescriptor, UrlState,
};
