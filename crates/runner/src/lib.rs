//! Switchboard Runner
//!
//! Demo orchestration over one in-process hub: responder endpoints for all
//! three send modes (fire-and-forget, one-shot request/reply, streaming
//! request/reply with cancellation).
//!
//! ## Architecture
//!
//! ```text
//!  requester ──send/request/request_stream──► Hub ──► endpoint handlers
//!      ▲                                                    │
//!      └───────────── reply channel ◄── ctx.reply(data) ────┘
//! ```

pub mod endpoints;

// Re-export main types
pub use endpoints::{AuditLog, JobRunner, PingResponder};
