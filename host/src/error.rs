//! Error types for host operations.
//!
//! Every variant ends up in the `err` field of a reply envelope; `kind()`
//! gives the panel something stable to match on.

use serde_json::{json, Value};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The outbound request could not be built or did not complete. HTTP
    /// error statuses are responses, not errors.
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The envelope's `data` did not fit the command.
    #[error("invalid input for `{command}`: {message}")]
    InvalidInput { command: String, message: String },

    /// A spawned helper process could not be started.
    #[error("could not launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl HostError {
    pub fn kind(&self) -> &'static str {
        match self {
            HostError::Io(_) => "io",
            HostError::Json(_) => "json",
            HostError::Http(_) => "http",
            HostError::NotFound(_) => "notFound",
            HostError::InvalidInput { .. } => "invalidInput",
            HostError::Launch { .. } => "launch",
        }
    }

    /// The `err` payload sent back to the panel.
    pub fn to_payload(&self, command: &str) -> Value {
        json!({
            "command": command,
            "kind": self.kind(),
            "message": self.to_string(),
        })
    }
}
