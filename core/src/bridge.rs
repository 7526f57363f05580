//! Call/response correlation on top of the raw transport.
//!
//! # Design
//! `Bridge` owns the in-flight table. `call` registers a `oneshot` sender
//! under a fresh `reqId`, sends the envelope and hands back a future before
//! any reply can arrive. Whoever reads the inbound side feeds envelopes to
//! `handle_reply` (or lets `pump` do it); the first reply with a known id
//! removes the entry and settles the future, later ones are dropped.
//!
//! Replies are matched by id only, so they may come back in any order.
//! There is no cancellation: dropping the returned future leaves the entry
//! until its reply (or the timeout, if configured) clears it.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::protocol::{InboundEnvelope, OutboundEnvelope, Payload};

pub type Reply = Result<Value, BridgeError>;

/// Future returned by `Bridge::call`.
pub type ReplyFuture = Pin<Box<dyn Future<Output = Reply> + Send>>;

struct PendingCall {
    command: String,
    reply: oneshot::Sender<Reply>,
}

struct Inner {
    tx: UnboundedSender<OutboundEnvelope>,
    pending: Mutex<HashMap<String, PendingCall>>,
    config: BridgeConfig,
}

/// Panel-side correlation layer. Cheap to clone; clones share one table.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("pending", &self.pending_len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Bridge {
    pub fn new(tx: UnboundedSender<OutboundEnvelope>, config: BridgeConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                tx,
                pending: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Issue a correlated call. The envelope is on the wire by the time this
    /// returns; awaiting the future only waits for the reply.
    pub fn call(&self, payload: Payload) -> ReplyFuture {
        let req_id = next_req_id();
        let command = payload.command.clone();
        let (reply_tx, mut reply_rx) = oneshot::channel();

        self.table().insert(
            req_id.clone(),
            PendingCall {
                command: command.clone(),
                reply: reply_tx,
            },
        );

        let envelope = OutboundEnvelope {
            req_id: req_id.clone(),
            payload,
        };
        if self.inner.tx.send(envelope).is_err() {
            self.table().remove(&req_id);
            tracing::warn!(req_id = %req_id, command = %command, "transport closed before send");
            return Box::pin(async { Err(BridgeError::ChannelClosed) });
        }
        tracing::debug!(req_id = %req_id, command = %command, pending = self.pending_len(), "call sent");

        let Some(after) = self.inner.config.call_timeout else {
            return Box::pin(async move { reply_rx.await.unwrap_or(Err(BridgeError::ChannelClosed)) });
        };

        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            match tokio::time::timeout(after, &mut reply_rx).await {
                Ok(settled) => settled.unwrap_or(Err(BridgeError::ChannelClosed)),
                Err(_) => {
                    let expired = lock(&inner.pending).remove(&req_id).is_some();
                    if !expired {
                        // The reply won the race against the timer. Whoever
                        // removed the entry sent under the same lock.
                        return reply_rx.try_recv().unwrap_or(Err(BridgeError::ChannelClosed));
                    }
                    tracing::warn!(req_id = %req_id, command = %command, ?after, "call timed out");
                    Err(BridgeError::Timeout { command, after })
                }
            }
        })
    }

    /// Send a command that expects no reply. Nothing is registered.
    pub fn notify(&self, payload: Payload) -> Result<(), BridgeError> {
        let envelope = OutboundEnvelope {
            req_id: next_req_id(),
            payload,
        };
        tracing::debug!(command = %envelope.payload.command, "notify sent");
        self.inner
            .tx
            .send(envelope)
            .map_err(|_| BridgeError::ChannelClosed)
    }

    /// Route one inbound envelope. Returns `false` if nothing was waiting
    /// for its `reqId`.
    ///
    /// The reply is sent before the table lock is released, so a call that
    /// finds its entry gone can rely on the reply already being there.
    pub fn handle_reply(&self, envelope: InboundEnvelope) -> bool {
        let mut table = self.table();
        let Some(call) = table.remove(&envelope.req_id) else {
            drop(table);
            tracing::debug!(req_id = %envelope.req_id, "dropping reply with no pending call");
            return false;
        };

        let outcome = envelope.into_outcome().map_err(BridgeError::Rejected);
        if outcome.is_err() {
            tracing::debug!(command = %call.command, "call rejected by host");
        }
        // The caller may have dropped its future; the entry is gone either way.
        let _ = call.reply.send(outcome);
        true
    }

    /// Drain the inbound side of the transport until it closes, then fail
    /// whatever is still pending.
    pub async fn pump(&self, mut rx: UnboundedReceiver<InboundEnvelope>) {
        while let Some(envelope) = rx.recv().await {
            self.handle_reply(envelope);
        }
        self.fail_pending();
    }

    /// Reject every in-flight call with `ChannelClosed`.
    pub fn fail_pending(&self) {
        let mut table = self.table();
        if !table.is_empty() {
            tracing::warn!(count = table.len(), "transport closed with calls pending");
        }
        for (_, call) in table.drain() {
            let _ = call.reply.send(Err(BridgeError::ChannelClosed));
        }
    }

    /// Number of calls still waiting for a reply.
    pub fn pending_len(&self) -> usize {
        self.table().len()
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, PendingCall>> {
        lock(&self.inner.pending)
    }
}

fn lock(table: &Mutex<HashMap<String, PendingCall>>) -> MutexGuard<'_, HashMap<String, PendingCall>> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn next_req_id() -> String {
    Uuid::new_v4().to_string()
}
