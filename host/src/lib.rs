//! Host side of the request panel.
//!
//! Receives command envelopes, runs the privileged operation behind each
//! one (route discovery, preset storage, port probes, outbound HTTP,
//! launching the editor or a terminal) and replies with the envelope's
//! `reqId`. `HostOperations` is the seam: `LocalHost` is the bundled
//! implementation, tests plug in their own.

pub mod config;
pub mod discovery;
pub mod error;
pub mod http_exec;
pub mod local;
pub mod ops;
pub mod router;
pub mod serve;
pub mod storage;

pub use config::HostConfig;
pub use error::HostError;
pub use local::LocalHost;
pub use ops::HostOperations;
pub use router::{CommandRouter, Route};
pub use serve::{serve, serve_lines};
pub use storage::CatalogStore;
