//! Error types for the panel side.
//!
//! # Design
//! `Rejected` carries the host's error payload verbatim so callers can show
//! whatever the host said. `Timeout` exists only when a call timeout is
//! configured; without one a call with no reply stays pending.

use std::time::Duration;

use serde_json::Value;

/// Why a bridged call did not resolve with data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// The host replied with `err` instead of `data`.
    #[error("host rejected the call: {0}")]
    Rejected(Value),

    /// No reply arrived within the configured call timeout.
    #[error("no reply to `{command}` after {after:?}")]
    Timeout { command: String, after: Duration },

    /// The transport is gone; the envelope could not be sent or the reply
    /// stream ended while the call was pending.
    #[error("transport channel closed")]
    ChannelClosed,
}

/// Errors surfaced by asynchronous store transitions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// A reply did not have the shape the transition expected.
    #[error("unexpected reply shape: {0}")]
    Decode(String),

    /// The transition needs a selected url and there is none.
    #[error("no url selected")]
    NoUrlSelected,

    /// Local state could not be serialized into a payload.
    #[error("could not encode payload: {0}")]
    Encode(String),
}
