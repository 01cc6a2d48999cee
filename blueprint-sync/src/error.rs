//! Error taxonomy for the sync core.
//!
//! Nothing here is fatal to the process: transient connectivity failures
//! recover through backoff, capacity overflow drops the oldest queued
//! message, and malformed frames are skipped. The client mirrors the most
//! recent failure into an observable error string for the UI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// An inbound frame or payload could not be decoded.
    #[error("failed to parse message: {0}")]
    Parse(String),

    /// An outbound envelope could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(String),

    /// The transport rejected a send.
    #[error("failed to send message: {0}")]
    Send(String),

    /// A send did not complete within the per-message timeout.
    #[error("message send timeout")]
    Timeout,

    /// No live connection.
    #[error("connection closed")]
    Closed,

    /// Reconnect attempts are exhausted; a fresh `connect` is required.
    #[error("failed to connect after {0} attempts")]
    RetriesExhausted(u32),
}
