//! Demo responder endpoints registered on the hub

use async_trait::async_trait;
use log::info;
use serde_json::{Value, json};
use std::time::Duration;
use switchboard_hub::{HubResult, MessageHandler, ReplyContext};

/// Answers "status.ping" requests with a single pong
pub struct PingResponder;

#[async_trait]
impl MessageHandler for PingResponder {
    async fn on_message(&self, ctx: ReplyContext, payload: Value) -> HubResult<()> {
        info!("ping received: {}", payload);
        ctx.reply(json!({ "pong": true })).await;
        Ok(())
    }
}

/// Streams staged progress replies for "job.run" requests
pub struct JobRunner {
    step: Duration,
}

impl JobRunner {
    /// A runner reporting progress every `step`
    pub fn new(step: Duration) -> Self {
        Self { step }
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

#[async_trait]
impl MessageHandler for JobRunner {
    async fn on_message(&self, ctx: ReplyContext, payload: Value) -> HubResult<()> {
        info!("job accepted: {}", payload);
        for pct in [25, 50, 75, 100] {
            tokio::time::sleep(self.step).await;
            ctx.reply(json!({ "progress": pct })).await;
        }
        Ok(())
    }
}

/// Logs audit events; never replies
pub struct AuditLog;

#[async_trait]
impl MessageHandler for AuditLog {
    async fn on_message(&self, ctx: ReplyContext, payload: Value) -> HubResult<()> {
        info!(
            "audit[{}]: {} (reply armed: {})",
            ctx.channel(),
            payload,
            ctx.can_reply()
        );
        Ok(())
    }
}
