// Loopback tests for the WebSocket transport: a fake device listens on an
// ephemeral port and is bridged with the same `spawn_link` the client uses.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use url::Url;

use exolink_api::websocket::{self, spawn_link};
use exolink_api::{Error, Frame, Link, decode};

// ── Helpers ─────────────────────────────────────────────────────────

/// Start a fake device and connect a client to it.
async fn connected_pair(device_cancel: CancellationToken) -> (Link, Link) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let device = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        spawn_link(ws, device_cancel)
    });

    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    let client = websocket::connect(&url, Duration::from_secs(5), CancellationToken::new())
        .await
        .unwrap();

    (client, device.await.unwrap())
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn frames_flow_both_ways() {
    let (mut client, mut device) = connected_pair(CancellationToken::new()).await;

    client
        .send(r#"{"dev":"SERVO","req":"GET","attr":"POSITION"}"#.into())
        .unwrap();
    assert_eq!(
        device.recv().await.as_deref(),
        Some(r#"{"dev":"SERVO","req":"GET","attr":"POSITION"}"#)
    );

    device
        .send(r#"{"dev":"SERVO","attr":"POSITION","val":45}"#.into())
        .unwrap();
    let frame = client.recv().await.unwrap();
    assert!(matches!(decode(&frame).unwrap(), Frame::Message(_)));
}

#[tokio::test]
async fn inbound_order_is_preserved() {
    let (mut client, device) = connected_pair(CancellationToken::new()).await;

    for reading in 0..50 {
        device
            .send(format!(r#"{{"dev":"FLEX_2","attr":"READ","val":{reading}}}"#))
            .unwrap();
    }
    for reading in 0..50 {
        let frame = client.recv().await.unwrap();
        assert!(frame.ends_with(&format!(":{reading}}}")), "out of order: {frame}");
    }
}

#[tokio::test]
async fn device_close_ends_the_inbound_queue() {
    let device_cancel = CancellationToken::new();
    let (mut client, _device) = connected_pair(device_cancel.clone()).await;

    device_cancel.cancel();
    assert_eq!(client.recv().await, None);
}

#[tokio::test]
async fn frames_queued_before_cancel_are_delivered() {
    let device_cancel = CancellationToken::new();
    let (mut client, device) = connected_pair(device_cancel.clone()).await;

    for reading in 0..20 {
        device
            .send(format!(r#"{{"dev":"FLEX_2","attr":"READ","val":{reading}}}"#))
            .unwrap();
    }
    device_cancel.cancel();

    for reading in 0..20 {
        let frame = client.recv().await.expect("frame lost at close");
        assert!(frame.ends_with(&format!(":{reading}}}")), "out of order: {frame}");
    }
    assert_eq!(client.recv().await, None);
}

#[tokio::test]
async fn refused_connection_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    let err = websocket::connect(&url, Duration::from_secs(5), CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::WebSocketConnect(_)), "got {err:?}");
}
