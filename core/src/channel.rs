//! In-process transport between the panel and the host.
//!
//! Two unbounded FIFO queues, one per direction. Nothing here pairs
//! requests with replies; that is the bridge's job.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::protocol::{InboundEnvelope, OutboundEnvelope};

/// The panel's half: sends requests, receives replies.
#[derive(Debug)]
pub struct UiEndpoint {
    pub tx: UnboundedSender<OutboundEnvelope>,
    pub rx: UnboundedReceiver<InboundEnvelope>,
}

/// The host's half: receives requests, sends replies.
#[derive(Debug)]
pub struct HostEndpoint {
    pub rx: UnboundedReceiver<OutboundEnvelope>,
    pub tx: UnboundedSender<InboundEnvelope>,
}

/// Create a connected pair of endpoints.
pub fn pair() -> (UiEndpoint, HostEndpoint) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    (
        UiEndpoint {
            tx: out_tx,
            rx: in_rx,
        },
        HostEndpoint {
            rx: out_rx,
            tx: in_tx,
        },
    )
}
