//! WebSocket transport.
//!
//! Connects to the device's `/ws` endpoint and bridges the socket to a
//! [`Link`]. A single background task owns the socket: it forwards text
//! frames inbound in arrival order and writes queued outbound frames, so
//! no locking is needed around the connection.
//!
//! Reconnection is the caller's business. When the socket closes, the
//! inbound queue ends and sends start failing with [`Error::LinkClosed`].
//!
//! # Example
//!
//! ```rust,ignore
//! use exolink_api::websocket;
//! use tokio_util::sync::CancellationToken;
//!
//! let url = url::Url::parse("ws://192.168.4.1/ws")?;
//! let mut link = websocket::connect(&url, Duration::from_secs(5), CancellationToken::new()).await?;
//! while let Some(frame) = link.recv().await {
//!     println!("{frame}");
//! }
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::link::Link;

/// Open a WebSocket to `url` and spawn the task that services it.
///
/// Cancelling `cancel` sends any frames still queued, then a close frame.
pub async fn connect(
    url: &Url,
    connect_timeout: Duration,
    cancel: CancellationToken,
) -> Result<Link, Error> {
    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(Error::UnsupportedScheme {
                scheme: other.into(),
            });
        }
    }

    tracing::info!(url = %url, "Connecting to WebSocket");

    let handshake = tokio_tungstenite::connect_async(url.as_str());
    let (ws_stream, _response) = tokio::time::timeout(connect_timeout, handshake)
        .await
        .map_err(|_| Error::Timeout {
            timeout_secs: connect_timeout.as_secs(),
        })?
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("WebSocket connected");

    Ok(spawn_link(ws_stream, cancel))
}

/// Bridge an established WebSocket stream to a [`Link`].
///
/// Works for either side of a connection, which is what lets tests stand
/// up a fake device on a local listener.
pub fn spawn_link<S>(ws_stream: WebSocketStream<S>, cancel: CancellationToken) -> Link
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        if let Err(e) = pump(ws_stream, inbound_tx, outbound_rx, cancel).await {
            tracing::warn!(error = %e, "WebSocket error");
        }
        tracing::debug!("WebSocket task exiting");
    });

    Link::new(inbound_rx, outbound_tx)
}

// ── Connection lifecycle ─────────────────────────────────────────────

/// Service one connection until it closes, errors, or is cancelled.
async fn pump<S>(
    ws_stream: WebSocketStream<S>,
    inbound_tx: mpsc::UnboundedSender<String>,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                // Frames queued before the cancel still go out ahead of the close.
                while let Ok(text) = outbound_rx.try_recv() {
                    tracing::trace!(frame = text.as_str(), "-> device");
                    write
                        .send(tungstenite::Message::text(text))
                        .await
                        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
                }
                tracing::debug!("WebSocket cancelled, sending close frame");
                let _ = write.send(tungstenite::Message::Close(None)).await;
                return Ok(());
            }
            outbound = outbound_rx.recv() => {
                let Some(text) = outbound else {
                    // Every sender dropped: nobody can talk to the device any more.
                    let _ = write.send(tungstenite::Message::Close(None)).await;
                    return Ok(());
                };
                tracing::trace!(frame = text.as_str(), "-> device");
                write
                    .send(tungstenite::Message::text(text))
                    .await
                    .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        tracing::trace!(frame = text.as_str(), "<- device");
                        if inbound_tx.send(text.as_str().to_owned()).is_err() {
                            tracing::debug!("inbound receiver dropped");
                            return Ok(());
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- the device only speaks text
                    }
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
