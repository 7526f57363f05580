//! Serve loops: feed envelopes to a `CommandRouter` and send back replies.
//!
//! Each envelope is dispatched on its own task, so a slow command never
//! holds up the ones queued behind it and replies go out in completion
//! order. The panel pairs them by `reqId`.

use std::sync::Arc;

use reqpanel_core::channel::HostEndpoint;
use reqpanel_core::{InboundEnvelope, OutboundEnvelope};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::ops::HostOperations;
use crate::router::CommandRouter;

/// Serve an in-process endpoint until the panel side closes, then wait for
/// in-flight commands to finish.
pub async fn serve<H: HostOperations>(router: Arc<CommandRouter<H>>, endpoint: HostEndpoint) {
    let HostEndpoint { mut rx, tx } = endpoint;
    let mut tasks = JoinSet::new();

    while let Some(envelope) = rx.recv().await {
        let router = Arc::clone(&router);
        let tx = tx.clone();
        tasks.spawn(async move {
            if let Some(reply) = router.dispatch(envelope).await {
                if tx.send(reply).is_err() {
                    tracing::debug!("panel went away before the reply was sent");
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {}
    tracing::debug!("endpoint closed");
}

/// Serve newline-delimited JSON: one `OutboundEnvelope` per input line, one
/// `InboundEnvelope` per output line. Malformed lines are logged and
/// skipped. Returns once input ends and every reply has been written.
pub async fn serve_lines<H, R, W>(
    router: Arc<CommandRouter<H>>,
    reader: R,
    mut writer: W,
) -> std::io::Result<()>
where
    H: HostOperations,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<InboundEnvelope>();
    let mut lines = reader.lines();
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let envelope: OutboundEnvelope = match serde_json::from_str(&line) {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        tracing::warn!(%err, "skipping malformed envelope");
                        continue;
                    }
                };
                let router = Arc::clone(&router);
                let reply_tx = reply_tx.clone();
                tasks.spawn(async move {
                    if let Some(reply) = router.dispatch(envelope).await {
                        let _ = reply_tx.send(reply);
                    }
                });
            }
            Some(reply) = reply_rx.recv() => write_line(&mut writer, &reply).await?,
        }
    }

    drop(reply_tx);
    while tasks.join_next().await.is_some() {}
    while let Some(reply) = reply_rx.recv().await {
        write_line(&mut writer, &reply).await?;
    }
    writer.flush().await
}

async fn write_line<W: AsyncWrite + Unpin>(
    writer: &mut W,
    reply: &InboundEnvelope,
) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(reply)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await
}
