//! In-process handle to a full-duplex, ordered text channel.
//!
//! A [`Link`] is what every transport hands to the session: one queue of
//! inbound frames in arrival order and one queue for outbound frames.
//! Sending never blocks, so commands are fire-and-forget.

use tokio::sync::mpsc;

use crate::error::Error;

/// Sending half of a [`Link`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LinkSender {
    tx: mpsc::UnboundedSender<String>,
}

impl LinkSender {
    /// Queue one frame for the transport.
    pub fn send(&self, frame: String) -> Result<(), Error> {
        self.tx.send(frame).map_err(|_| Error::LinkClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One end of a text channel to a device.
#[derive(Debug)]
pub struct Link {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: LinkSender,
}

impl Link {
    pub fn new(
        inbound: mpsc::UnboundedReceiver<String>,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            inbound,
            outbound: LinkSender { tx: outbound },
        }
    }

    /// Two connected in-memory ends: whatever one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_rx, b_tx), Self::new(b_rx, a_tx))
    }

    /// Next inbound frame, or `None` once the transport has shut down.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    pub fn send(&self, frame: String) -> Result<(), Error> {
        self.outbound.send(frame)
    }

    pub fn sender(&self) -> LinkSender {
        self.outbound.clone()
    }

    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<String>, LinkSender) {
        (self.inbound, self.outbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_is_crossed() {
        let (mut a, mut b) = Link::pair();
        a.send("ping".into()).unwrap();
        b.send("pong".into()).unwrap();
        assert_eq!(b.recv().await.as_deref(), Some("ping"));
        assert_eq!(a.recv().await.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn send_fails_once_peer_is_dropped() {
        let (a, b) = Link::pair();
        drop(b);
        assert!(matches!(a.send("x".into()), Err(Error::LinkClosed)));
        assert!(a.sender().is_closed());
    }

    #[tokio::test]
    async fn preserves_order() {
        let (a, mut b) = Link::pair();
        for i in 0..10 {
            a.send(i.to_string()).unwrap();
        }
        for i in 0..10 {
            assert_eq!(b.recv().await, Some(i.to_string()));
        }
    }
}
