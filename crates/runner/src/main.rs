//! Demo entry point: wires responder and requester endpoints over one
//! in-process hub and exercises all three send modes.
//!
//! Run with `RUST_LOG=debug` to watch the routing layer at work.

use log::info;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use switchboard_hub::{Hub, HubResult};
use switchboard_runner::{AuditLog, JobRunner, PingResponder};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> HubResult<()> {
    env_logger::init();

    let hub = Hub::in_process();

    hub.on("status.ping", Arc::new(PingResponder));
    hub.on("job.run", Arc::new(JobRunner::default()));
    hub.on("audit", Arc::new(AuditLog));

    // Fire-and-forget
    hub.send("audit", json!({ "event": "startup" })).await?;

    // One-shot request/reply
    let (tx, mut pong) = mpsc::unbounded_channel();
    hub.request("status.ping", json!({ "from": "runner" }), move |reply| {
        let _ = tx.send(reply);
    })
    .await?;
    if let Some(reply) = pong.recv().await {
        info!("pong: {}", reply);
    }

    // Streaming request, cancelled once the job reports completion
    let (tx, mut progress) = mpsc::unbounded_channel();
    let job = hub
        .request_stream("job.run", json!({ "job": "reindex" }), move |reply| {
            let _ = tx.send(reply);
        })
        .await?;
    while let Some(update) = progress.recv().await {
        info!("progress: {}", update);
        if update["progress"] == 100 {
            break;
        }
    }
    job.cancel();

    hub.send("audit", json!({ "event": "shutdown" })).await?;
    // Let the audit pump drain before the runtime shuts down
    tokio::time::sleep(Duration::from_millis(50)).await;

    Ok(())
}
