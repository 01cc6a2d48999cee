//! Client configuration.
//!
//! The numeric policy values are the sync core's fixed defaults; they are
//! exposed as fields so tests can shrink the timing without changing
//! behavior. The base URL comes from the environment in deployments.

use std::time::Duration;

/// Environment variable overriding the default WebSocket base URL.
pub const WS_URL_ENV: &str = "BLUEPRINT_WS_URL";

const DEFAULT_WS_URL: &str = "ws://localhost:3000";
const MAX_RETRIES: u32 = 5;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(1000);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(30_000);
const MAX_QUEUE_SIZE: usize = 1000;
const MAX_MESSAGES_HISTORY: usize = 100;
const SEND_TIMEOUT: Duration = Duration::from_millis(5000);
const QUEUE_PROCESS_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base WebSocket URL, e.g. `ws://localhost:3000`.
    pub ws_base_url: String,
    /// Reconnect attempts before giving up.
    pub max_retries: u32,
    /// First backoff delay; doubles per failed attempt.
    pub initial_retry_delay: Duration,
    /// Backoff cap.
    pub max_retry_delay: Duration,
    /// Outbound queue capacity; oldest entries are evicted beyond this.
    pub max_queue_size: usize,
    /// Inbound history capacity.
    pub max_history: usize,
    /// Per-message send timeout.
    pub send_timeout: Duration,
    /// Pacing delay between queued sends.
    pub queue_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ws_base_url: DEFAULT_WS_URL.to_string(),
            max_retries: MAX_RETRIES,
            initial_retry_delay: INITIAL_RETRY_DELAY,
            max_retry_delay: MAX_RETRY_DELAY,
            max_queue_size: MAX_QUEUE_SIZE,
            max_history: MAX_MESSAGES_HISTORY,
            send_timeout: SEND_TIMEOUT,
            queue_interval: QUEUE_PROCESS_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Defaults with the base URL taken from `BLUEPRINT_WS_URL` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(WS_URL_ENV) {
            if !url.is_empty() {
                config.ws_base_url = url;
            }
        }
        config
    }

    /// Endpoint for one project's sync stream.
    pub fn project_url(&self, project_id: &str) -> String {
        format!("{}/ws/projects/{}", self.ws_base_url, project_id)
    }
}
