// ── Runtime session configuration ──
//
// Describes *how* to talk to one device. Never touches disk: the CLI
// builds a `SessionConfig` from its profile and hands it in.

use std::time::Duration;

use url::Url;

use crate::router::RetryPolicy;

/// Default access-point address of the device firmware.
pub const DEFAULT_URL: &str = "ws://192.168.4.1/ws";

/// Samples kept per flex sensor by the telemetry store.
pub const DEFAULT_HISTORY_LEN: usize = 256;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for one device session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket endpoint, e.g. `ws://192.168.4.1/ws`.
    pub url: Url,
    /// Limit on the WebSocket handshake.
    pub connect_timeout: Duration,
    /// Per-sensor reading history; 0 keeps only the latest value.
    pub history_len: usize,
    pub retry_policy: RetryPolicy,
}

impl SessionConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            history_len: DEFAULT_HISTORY_LEN,
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    #[must_use]
    pub fn with_history_len(mut self, history_len: usize) -> Self {
        self.history_len = history_len;
        self
    }
}
