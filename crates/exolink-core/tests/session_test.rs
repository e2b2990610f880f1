// Session behaviour over an in-memory link: the test plays the device
// on the other end of `Link::pair()`.
#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::{broadcast, mpsc};

use exolink_api::Link;
use exolink_core::{
    Attribute, ConnectionState, CoreError, Device, Diagnostic, EventSink, ProtocolEvent,
    Report, RetryPolicy, SensorAttribute, SensorIndex, ServoAttribute, Session, SessionConfig,
    Value,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config() -> SessionConfig {
    SessionConfig::new("ws://127.0.0.1:9/ws".parse().unwrap())
}

async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("timed out")
}

async fn next<T: Clone>(rx: &mut broadcast::Receiver<T>) -> T {
    within(rx.recv()).await.unwrap()
}

fn sensor(n: u8) -> SensorIndex {
    SensorIndex::new(n).unwrap()
}

/// A session attached to an in-memory device, with subscriptions taken
/// before any traffic.
struct Harness {
    session: Session,
    device: Link,
    events: broadcast::Receiver<Arc<ProtocolEvent>>,
    reports: broadcast::Receiver<Arc<Report>>,
}

async fn harness(config: SessionConfig) -> Harness {
    let (client, device) = Link::pair();
    let session = Session::new(config);
    let events = session.events();
    let reports = session.reports();
    session.attach(client).await.unwrap();
    Harness {
        session,
        device,
        events,
        reports,
    }
}

// ── Routing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn readings_reach_subscribers_and_store() {
    let mut h = harness(config()).await;

    h.device
        .send(r#"{"dev":"FLEX_3","attr":"READ","val":812}"#.into())
        .unwrap();

    let event = next(&mut h.events).await;
    assert_eq!(
        *event,
        ProtocolEvent::SensorReadingUpdated {
            sensor: sensor(3),
            reading: Value::from(812_i64),
        }
    );

    let stored = h
        .session
        .store()
        .latest(Device::Sensor(sensor(3)), Attribute::Sensor(SensorAttribute::Read))
        .unwrap();
    assert_eq!(stored.value, Value::from(812_i64));
    assert_eq!(h.session.store().history(sensor(3)).len(), 1);
}

#[tokio::test]
async fn rejected_set_requeries_the_device() {
    let mut h = harness(config()).await;

    h.device
        .send(r#"{"dev":"SERVO","req":"SET","attr":"MAX_PWM","val":2400,"stat":"ERROR"}"#.into())
        .unwrap();

    let requery = within(h.device.recv()).await.unwrap();
    assert_eq!(requery, r#"{"dev":"SERVO","req":"GET","attr":"MAX_PWM"}"#);

    let report = next(&mut h.reports).await;
    assert_eq!(
        *report,
        Report::Diagnostic(Diagnostic::SetRejected {
            device: Device::Servo,
            attribute: Attribute::Servo(ServoAttribute::MaxPwm),
        })
    );

    // The device answers the re-query; that answer is the first event.
    h.device
        .send(r#"{"dev":"SERVO","attr":"MAX_PWM","val":2000}"#.into())
        .unwrap();
    assert_eq!(
        *next(&mut h.events).await,
        ProtocolEvent::ServoAttributeUpdated {
            attribute: ServoAttribute::MaxPwm,
            value: Value::from(2000_i64),
        }
    );
}

#[tokio::test]
async fn disabled_retry_policy_sends_nothing() {
    let mut h = harness(config().with_retry_policy(RetryPolicy::Disabled)).await;

    h.device
        .send(r#"{"dev":"SERVO","req":"SET","attr":"PIN","val":99,"stat":"ERROR"}"#.into())
        .unwrap();
    assert!(matches!(
        &*next(&mut h.reports).await,
        Report::Diagnostic(Diagnostic::SetRejected { .. })
    ));

    h.session.get(Device::Flex, Attribute::Flex(exolink_core::FlexAttribute::SampleRate)).unwrap();
    // Only the explicit GET arrives; no re-query was queued before it.
    assert_eq!(
        within(h.device.recv()).await.unwrap(),
        r#"{"dev":"FLEX","req":"GET","attr":"SAMPLE_RATE"}"#
    );
}

#[tokio::test]
async fn accepted_set_is_acknowledged_without_event() {
    let mut h = harness(config()).await;

    h.device
        .send(r#"{"dev":"SERVO","req":"SET","attr":"ACTUATE","val":true,"stat":"OK"}"#.into())
        .unwrap();
    assert_eq!(
        *next(&mut h.reports).await,
        Report::Acknowledged {
            device: Device::Servo,
            attribute: Attribute::Servo(ServoAttribute::Actuate),
        }
    );

    h.device
        .send(r#"{"dev":"SERVO","attr":"POSITION","val":45}"#.into())
        .unwrap();
    assert_eq!(
        *next(&mut h.events).await,
        ProtocolEvent::ServoPositionUpdated {
            position: Value::from(45_i64),
        }
    );
}

#[tokio::test]
async fn bad_frames_do_not_stop_the_stream() {
    let mut h = harness(config()).await;

    for raw in [
        "garbage",
        r#"{"dev":"FLEX_9","attr":"READ","val":1}"#,
        r#"{"dev":"SERVO","attr":"POSITION"}"#,
        r#"{"error":"Invalid request","details":"PATCH"}"#,
    ] {
        h.device.send(raw.into()).unwrap();
    }
    h.device
        .send(r#"{"dev":"FLEX_2","attr":"READ","val":5}"#.into())
        .unwrap();

    let kinds: Vec<&str> = {
        let mut kinds = Vec::new();
        for _ in 0..4 {
            match &*next(&mut h.reports).await {
                Report::Diagnostic(d) => kinds.push(d.kind()),
                other => panic!("unexpected report {other:?}"),
            }
        }
        kinds
    };
    assert_eq!(
        kinds,
        ["decode", "unknown_device_or_attribute", "missing_value", "device_notice"]
    );

    assert_eq!(
        *next(&mut h.events).await,
        ProtocolEvent::SensorReadingUpdated {
            sensor: sensor(2),
            reading: Value::from(5_i64),
        }
    );
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn commands_are_encoded_onto_the_link() {
    let mut h = harness(config()).await;

    h.session
        .set(Device::Sensor(sensor(5)), Attribute::Sensor(SensorAttribute::Pin), false)
        .unwrap();
    assert_eq!(
        within(h.device.recv()).await.unwrap(),
        r#"{"dev":"FLEX_5","req":"SET","attr":"PIN","val":false}"#
    );

    let err = h
        .session
        .get(Device::Flex, Attribute::Sensor(SensorAttribute::Read))
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidCommand(_)));
}

#[tokio::test]
async fn query_all_requests_every_setting() {
    let mut h = harness(config()).await;

    let issued = h.session.query_all().unwrap();
    assert_eq!(issued, 15);

    let mut frames = Vec::new();
    for _ in 0..issued {
        frames.push(within(h.device.recv()).await.unwrap());
    }
    assert_eq!(frames[0], r#"{"dev":"SERVO","req":"GET","attr":"ANGLE_STEP"}"#);
    assert_eq!(frames[10], r#"{"dev":"FLEX","req":"GET","attr":"SAMPLE_RATE"}"#);
    assert_eq!(frames[14], r#"{"dev":"FLEX_5","req":"GET","attr":"PIN"}"#);
    assert!(frames.iter().all(|f| !f.contains("\"POSITION\"") && !f.contains("\"READ\"")));
}

#[tokio::test]
async fn send_requires_a_connection() {
    let session = Session::new(config());
    let err = session
        .get(Device::Servo, Attribute::Servo(ServoAttribute::Pin))
        .unwrap_err();
    assert!(matches!(err, CoreError::NotConnected));
}

#[tokio::test]
async fn attach_only_once() {
    let h = harness(config()).await;
    let (extra, _device) = Link::pair();
    assert!(matches!(
        h.session.attach(extra).await,
        Err(CoreError::AlreadyConnected)
    ));
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn device_hangup_marks_session_failed() {
    let h = harness(config()).await;
    let mut state = h.session.connection_state();
    assert_eq!(*state.borrow(), ConnectionState::Connected);

    drop(h.device);
    within(state.wait_for(|s| *s == ConnectionState::Failed))
        .await
        .unwrap();
}

struct Collector {
    tx: mpsc::UnboundedSender<String>,
}

impl EventSink for Collector {
    fn on_event(&mut self, event: &ProtocolEvent) {
        let _ = self.tx.send(format!("{} {}", event.kind(), event.value()));
    }

    fn on_report(&mut self, report: &Report) {
        if let Report::Acknowledged { attribute, .. } = report {
            let _ = self.tx.send(format!("ack {attribute}"));
        }
    }

    fn on_close(&mut self) {
        let _ = self.tx.send("closed".into());
    }
}

#[tokio::test]
async fn sinks_receive_events_until_disconnect() {
    let (client, device) = Link::pair();
    let session = Session::new(config());
    let (tx, mut rx) = mpsc::unbounded_channel();
    session.spawn_sink(Collector { tx }).await;
    session.attach(client).await.unwrap();

    device
        .send(r#"{"dev":"SERVO","attr":"POSITION","val":30}"#.into())
        .unwrap();
    assert_eq!(
        within(rx.recv()).await.unwrap(),
        "servo_position_updated 30"
    );

    device
        .send(r#"{"dev":"FLEX","req":"SET","attr":"START","val":true,"stat":"OK"}"#.into())
        .unwrap();
    assert_eq!(within(rx.recv()).await.unwrap(), "ack START");

    session.disconnect().await;
    assert_eq!(within(rx.recv()).await.unwrap(), "closed");
    assert_eq!(
        *session.connection_state().borrow(),
        ConnectionState::Disconnected
    );
}
