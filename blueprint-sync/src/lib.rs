//! # blueprint-sync — Realtime sync core for the building-model editor
//!
//! Keeps editor clients consistent with the shared model server over one
//! WebSocket per project, with automatic reconnection and bounded buffers.
//!
//! ## Architecture
//!
//! ```text
//! UI action ── domain store ── enqueue ──► ┌──────────────┐
//!                                          │ OutboundQueue│ (drop-oldest, 1000)
//!                                          └──────┬───────┘
//!                                                 ▼
//!                                          QueueProcessor  (single-flight,
//!                                                 │         5s/send, 100ms pace)
//!                                                 ▼
//!                         ws://<base>/ws/projects/<id>  (JSON text frames)
//!                                                 │
//!                                                 ▼
//!                                          Dispatcher ──► ElementStore
//!                                                 │   ──► RelationshipStore
//!                                                 │   ──► ViewStore
//!                                                 ▼
//!                                          MessageHistory (last 100)
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] — JSON wire envelope and codec
//! - [`config`] — policy defaults and endpoint layout
//! - [`queue`] — bounded outbound queue and inbound history
//! - [`consumer`] — ports into the domain state containers
//! - [`client`] — connection state machine, processor, dispatcher
//!
//! Reconnects back off exponentially (1s doubling to 30s, 5 attempts) and
//! stop at `Failed` until an explicit `connect`; the outbound queue drains
//! in FIFO order once a connection is live again. Updates missed while
//! offline are not replayed — callers refetch through the REST API if they
//! need a full resync.

pub mod client;
pub mod config;
pub mod consumer;
pub mod error;
pub mod protocol;
pub mod queue;

pub use client::{ConnectionState, SyncClient};
pub use config::SyncConfig;
pub use consumer::{Consumers, EntityConsumer, ViewConsumer};
pub use error::SyncError;
pub use protocol::{Envelope, MessageType, Payload};
pub use queue::{MessageHistory, OutboundQueue};
