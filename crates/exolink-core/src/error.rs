// ── Core error types ──
//
// Session-level failures. Per-message protocol problems are not errors
// here: they surface as `Diagnostic`s and never end the session. The
// `From<exolink_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use exolink_api::InvalidCommand;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Device connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Session is not connected")]
    NotConnected,

    #[error("Session is already connected")]
    AlreadyConnected,

    #[error("Device disconnected")]
    DeviceDisconnected,

    // ── Command errors ───────────────────────────────────────────────
    #[error(transparent)]
    InvalidCommand(#[from] InvalidCommand),

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<exolink_api::Error> for CoreError {
    fn from(err: exolink_api::Error) -> Self {
        match err {
            exolink_api::Error::UnsupportedScheme { scheme } => CoreError::Config {
                message: format!("Unsupported URL scheme '{scheme}' (expected ws or wss)"),
            },
            exolink_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            exolink_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            exolink_api::Error::LinkClosed => CoreError::DeviceDisconnected,
            exolink_api::Error::InvalidCommand(e) => CoreError::InvalidCommand(e),
        }
    }
}
