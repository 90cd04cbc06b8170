//! Integration tests: full round-trips through the hub
//!
//! Requester -> Hub -> ListenerAdapter -> handler -> reply channel -> requester

use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use switchboard_hub::{Hub, HubError, HubResult, MessageHandler, ReplyContext};
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(1);
const QUIET: Duration = Duration::from_millis(150);

/// Records every payload it sees, along with whether a reply was possible
struct Recorder {
    tx: mpsc::UnboundedSender<(Value, bool)>,
}

#[async_trait]
impl MessageHandler for Recorder {
    async fn on_message(&self, ctx: ReplyContext, payload: Value) -> HubResult<()> {
        self.tx
            .send((payload, ctx.can_reply()))
            .map_err(HubError::handler)
    }
}

/// Replies `{"y": 2}` twice and stashes its context for later stray replies
struct DoubleReplier {
    stash: Arc<Mutex<Option<ReplyContext>>>,
}

#[async_trait]
impl MessageHandler for DoubleReplier {
    async fn on_message(&self, ctx: ReplyContext, _payload: Value) -> HubResult<()> {
        ctx.reply(json!({ "y": 2 })).await;
        ctx.reply(json!({ "y": 3 })).await;
        *self.stash.lock().unwrap() = Some(ctx);
        Ok(())
    }
}

/// Echoes the request payload back to its requester
struct EchoPayload;

#[async_trait]
impl MessageHandler for EchoPayload {
    async fn on_message(&self, ctx: ReplyContext, payload: Value) -> HubResult<()> {
        ctx.reply(payload).await;
        Ok(())
    }
}

/// Streams three numbered replies and stashes its context
struct Streamer {
    stash: Arc<Mutex<Option<ReplyContext>>>,
}

#[async_trait]
impl MessageHandler for Streamer {
    async fn on_message(&self, ctx: ReplyContext, _payload: Value) -> HubResult<()> {
        for n in 1..=3 {
            ctx.reply(json!({ "n": n })).await;
        }
        *self.stash.lock().unwrap() = Some(ctx);
        Ok(())
    }
}

/// Removes one pre-installed handler and installs a fresh one, from inside
/// its own dispatch
struct RegistryJuggler {
    hub: Arc<Hub>,
    victim: Arc<dyn MessageHandler>,
    replacement_tx: mpsc::UnboundedSender<(Value, bool)>,
    outcome: mpsc::UnboundedSender<(bool, bool)>,
}

#[async_trait]
impl MessageHandler for RegistryJuggler {
    async fn on_message(&self, _ctx: ReplyContext, _payload: Value) -> HubResult<()> {
        let removed = self.hub.off("active", &self.victim);
        let installed = self.hub.on(
            "drained",
            Arc::new(Recorder {
                tx: self.replacement_tx.clone(),
            }),
        );
        self.outcome
            .send((removed, installed))
            .map_err(HubError::handler)
    }
}

fn reply_collector() -> (
    impl FnMut(Value) + Send + 'static,
    mpsc::UnboundedReceiver<Value>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |value| {
            let _ = tx.send(value);
        },
        rx,
    )
}

/// Wait for a responder to finish and stash its context
async fn take_ctx(stash: &Arc<Mutex<Option<ReplyContext>>>) -> ReplyContext {
    for _ in 0..100 {
        if let Some(ctx) = stash.lock().unwrap().take() {
            return ctx;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("handler never stashed its context");
}

#[tokio::test]
async fn test_one_shot_round_trip_fires_exactly_once() {
    let _ = env_logger::try_init();
    let hub = Hub::in_process();

    let stash = Arc::new(Mutex::new(None));
    assert!(hub.on(
        "ping",
        Arc::new(DoubleReplier {
            stash: stash.clone()
        })
    ));

    let (on_reply, mut replies) = reply_collector();
    hub.request("ping", json!({ "x": 1 }), on_reply).await.unwrap();

    // First reply only; the subscription is gone before the second lands
    assert_eq!(
        timeout(WAIT, replies.recv()).await.unwrap(),
        Some(json!({ "y": 2 }))
    );
    assert_eq!(timeout(WAIT, replies.recv()).await.unwrap(), None);

    // A further stray reply on the same reply channel is dropped silently
    let ctx = take_ctx(&stash).await;
    ctx.reply(json!({ "y": 4 })).await;
}

#[tokio::test]
async fn test_handler_sees_payload_and_reply_capability() {
    let hub = Hub::in_process();
    let (tx, mut seen) = mpsc::unbounded_channel();
    hub.on("ping", Arc::new(Recorder { tx }));

    let (on_reply, _replies) = reply_collector();
    hub.request("ping", json!({ "x": 1 }), on_reply).await.unwrap();

    let (payload, could_reply) = timeout(WAIT, seen.recv()).await.unwrap().unwrap();
    assert_eq!(payload, json!({ "x": 1 }));
    assert!(could_reply);
}

#[tokio::test]
async fn test_fire_and_forget_has_no_reply_capability() {
    let hub = Hub::in_process();
    let (tx, mut seen) = mpsc::unbounded_channel();
    hub.on("audit", Arc::new(Recorder { tx }));

    let handle = hub.send("audit", json!({ "event": "startup" })).await.unwrap();
    assert!(!handle.is_armed());

    let (payload, could_reply) = timeout(WAIT, seen.recv()).await.unwrap().unwrap();
    assert_eq!(payload, json!({ "event": "startup" }));
    assert!(!could_reply);
}

#[tokio::test]
async fn test_streaming_replies_arrive_in_order_until_cancelled() {
    let _ = env_logger::try_init();
    let hub = Hub::in_process();

    let stash = Arc::new(Mutex::new(None));
    hub.on(
        "job.run",
        Arc::new(Streamer {
            stash: stash.clone(),
        }),
    );

    let (on_reply, mut replies) = reply_collector();
    let handle = hub
        .request_stream("job.run", json!({ "job": "reindex" }), on_reply)
        .await
        .unwrap();
    assert!(handle.is_armed());

    for n in 1..=3 {
        assert_eq!(
            timeout(WAIT, replies.recv()).await.unwrap(),
            Some(json!({ "n": n }))
        );
    }

    handle.cancel();
    handle.cancel(); // idempotent

    // Replies after cancellation are dropped at the removed subscription
    let ctx = take_ctx(&stash).await;
    ctx.reply(json!({ "n": 4 })).await;
    assert_eq!(timeout(WAIT, replies.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_request_on_silent_channel_never_calls_back() {
    let hub = Hub::in_process();

    let (on_reply, mut replies) = reply_collector();
    let handle = hub
        .request("nobody", json!({ "x": 1 }), on_reply)
        .await
        .unwrap();

    assert!(timeout(QUIET, replies.recv()).await.is_err());
    handle.cancel();
}

#[tokio::test]
async fn test_broadcast_reaches_every_registration() {
    let hub = Hub::in_process();
    let (tx1, mut seen1) = mpsc::unbounded_channel();
    let (tx2, mut seen2) = mpsc::unbounded_channel();
    hub.on("active", Arc::new(Recorder { tx: tx1 }));
    hub.on("active", Arc::new(Recorder { tx: tx2 }));

    hub.send("active", json!({ "scope": "main" })).await.unwrap();

    for seen in [&mut seen1, &mut seen2] {
        let (payload, _) = timeout(WAIT, seen.recv()).await.unwrap().unwrap();
        assert_eq!(payload, json!({ "scope": "main" }));
    }
}

#[tokio::test]
async fn test_off_stops_further_deliveries() {
    let hub = Hub::in_process();
    let (tx, mut seen) = mpsc::unbounded_channel();
    let handler: Arc<dyn MessageHandler> = Arc::new(Recorder { tx });
    hub.on("active", handler.clone());

    hub.send("active", json!(1)).await.unwrap();
    assert!(timeout(WAIT, seen.recv()).await.unwrap().is_some());

    assert!(hub.off("active", &handler));
    hub.send("active", json!(2)).await.unwrap();
    assert!(timeout(QUIET, seen.recv()).await.is_err());
}

#[tokio::test]
async fn test_concurrent_requests_receive_only_their_own_replies() {
    let hub = Hub::in_process();
    hub.on("echo", Arc::new(EchoPayload));

    let (on_reply_a, mut replies_a) = reply_collector();
    let (on_reply_b, mut replies_b) = reply_collector();
    hub.request("echo", json!({ "from": "a" }), on_reply_a)
        .await
        .unwrap();
    hub.request("echo", json!({ "from": "b" }), on_reply_b)
        .await
        .unwrap();

    assert_eq!(
        timeout(WAIT, replies_a.recv()).await.unwrap(),
        Some(json!({ "from": "a" }))
    );
    assert_eq!(
        timeout(WAIT, replies_b.recv()).await.unwrap(),
        Some(json!({ "from": "b" }))
    );
    // One-shot subscriptions are gone after their single reply
    assert_eq!(timeout(WAIT, replies_a.recv()).await.unwrap(), None);
    assert_eq!(timeout(WAIT, replies_b.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn test_install_and_remove_are_safe_during_dispatch() {
    let hub = Arc::new(Hub::in_process());

    let (victim_tx, mut victim_seen) = mpsc::unbounded_channel();
    let victim: Arc<dyn MessageHandler> = Arc::new(Recorder { tx: victim_tx });
    hub.on("active", victim.clone());

    let (replacement_tx, mut replacement_seen) = mpsc::unbounded_channel();
    let (outcome_tx, mut outcome) = mpsc::unbounded_channel();
    hub.on(
        "admin.reconfigure",
        Arc::new(RegistryJuggler {
            hub: hub.clone(),
            victim: victim.clone(),
            replacement_tx,
            outcome: outcome_tx,
        }),
    );

    hub.send("active", json!(1)).await.unwrap();
    assert!(timeout(WAIT, victim_seen.recv()).await.unwrap().is_some());

    // Both registry mutations happen inside the juggler's handler body
    hub.send("admin.reconfigure", json!({})).await.unwrap();
    let (removed, installed) = timeout(WAIT, outcome.recv()).await.unwrap().unwrap();
    assert!(removed);
    assert!(installed);

    hub.send("active", json!(2)).await.unwrap();
    assert!(timeout(QUIET, victim_seen.recv()).await.is_err());

    hub.send("drained", json!(3)).await.unwrap();
    let (payload, _) = timeout(WAIT, replacement_seen.recv()).await.unwrap().unwrap();
    assert_eq!(payload, json!(3));
}

#[tokio::test]
async fn test_reregistering_after_removal_delivers_again() {
    let hub = Hub::in_process();
    let (tx, mut seen) = mpsc::unbounded_channel();
    let handler: Arc<dyn MessageHandler> = Arc::new(Recorder { tx });

    assert!(hub.on("active", handler.clone()));
    assert!(hub.off("active", &handler));
    assert!(hub.on("active", handler.clone()));

    hub.send("active", json!({ "again": true })).await.unwrap();
    let (payload, _) = timeout(WAIT, seen.recv()).await.unwrap().unwrap();
    assert_eq!(payload, json!({ "again": true }));
}
