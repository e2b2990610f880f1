use thiserror::Error;

use crate::command::InvalidCommand;

/// Top-level error type for the `exolink-api` crate.
///
/// Covers transport setup, the link itself, and protocol encoding.
/// `exolink-core` maps these into session-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The URL does not use the `ws` or `wss` scheme.
    #[error("Unsupported URL scheme '{scheme}' (expected ws or wss)")]
    UnsupportedScheme { scheme: String },

    /// Connection attempt timed out.
    #[error("Connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket handshake or stream failure.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// The link's other end is gone; nothing more can be sent.
    #[error("Link closed")]
    LinkClosed,

    // ── Protocol ────────────────────────────────────────────────────
    #[error(transparent)]
    InvalidCommand(#[from] InvalidCommand),
}
