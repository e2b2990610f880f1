// ── Protocol events ──
//
// Typed snapshots of device state, one per routed message. Consumers
// subscribe to these instead of inspecting raw frames.

use exolink_api::{
    Attribute, Device, FlexAttribute, SensorAttribute, SensorIndex, ServoAttribute, Value,
};
use serde::Serialize;
use strum::IntoStaticStr;

use crate::diagnostic::Diagnostic;

/// A device-reported state change.
#[derive(Debug, Clone, PartialEq, Serialize, IntoStaticStr)]
#[serde(tag = "event", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProtocolEvent {
    /// Current servo angle. Pushed continuously while the servo moves.
    ServoPositionUpdated { position: Value },
    ServoAttributeUpdated {
        attribute: ServoAttribute,
        value: Value,
    },
    FlexControlUpdated {
        attribute: FlexAttribute,
        value: Value,
    },
    /// Raw ADC reading from one flex sensor.
    SensorReadingUpdated { sensor: SensorIndex, reading: Value },
    /// Pin assignment of one flex sensor; `false` means not connected.
    SensorPinUpdated { sensor: SensorIndex, value: Value },
}

impl ProtocolEvent {
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    /// The device this event describes.
    pub fn device(&self) -> Device {
        match self {
            Self::ServoPositionUpdated { .. } | Self::ServoAttributeUpdated { .. } => Device::Servo,
            Self::FlexControlUpdated { .. } => Device::Flex,
            Self::SensorReadingUpdated { sensor, .. } | Self::SensorPinUpdated { sensor, .. } => {
                Device::Sensor(*sensor)
            }
        }
    }

    pub fn attribute(&self) -> Attribute {
        match self {
            Self::ServoPositionUpdated { .. } => Attribute::Servo(ServoAttribute::Position),
            Self::ServoAttributeUpdated { attribute, .. } => Attribute::Servo(*attribute),
            Self::FlexControlUpdated { attribute, .. } => Attribute::Flex(*attribute),
            Self::SensorReadingUpdated { .. } => Attribute::Sensor(SensorAttribute::Read),
            Self::SensorPinUpdated { .. } => Attribute::Sensor(SensorAttribute::Pin),
        }
    }

    /// The payload, exactly as the device sent it.
    pub fn value(&self) -> &Value {
        match self {
            Self::ServoPositionUpdated { position } => position,
            Self::SensorReadingUpdated { reading, .. } => reading,
            Self::ServoAttributeUpdated { value, .. }
            | Self::FlexControlUpdated { value, .. }
            | Self::SensorPinUpdated { value, .. } => value,
        }
    }
}

// ── Reports ──────────────────────────────────────────────────────────

/// Side-channel output of the router: acknowledgements and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    /// The device accepted a `SET`.
    Acknowledged { device: Device, attribute: Attribute },
    Diagnostic(Diagnostic),
}

// ── EventSink ────────────────────────────────────────────────────────

/// A consumer driven by the session's event bus.
///
/// Register with [`Session::spawn_sink`](crate::Session::spawn_sink);
/// callbacks run on a dedicated task in arrival order.
pub trait EventSink: Send + 'static {
    fn on_event(&mut self, event: &ProtocolEvent);

    fn on_report(&mut self, _report: &Report) {}

    /// Called once when the session shuts down.
    fn on_close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn events_know_their_address() {
        let sensor = SensorIndex::new(4).unwrap();
        let event = ProtocolEvent::SensorReadingUpdated {
            sensor,
            reading: Value::from(2048_i64),
        };
        assert_eq!(event.device(), Device::Sensor(sensor));
        assert_eq!(event.attribute(), Attribute::Sensor(SensorAttribute::Read));
        assert_eq!(event.value(), &Value::from(2048_i64));
        assert_eq!(event.kind(), "sensor_reading_updated");
    }

    #[test]
    fn serializes_with_event_tag() {
        let event = ProtocolEvent::ServoAttributeUpdated {
            attribute: ServoAttribute::Motion,
            value: Value::from("SWEEP"),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            serde_json::json!({
                "event": "servo_attribute_updated",
                "attribute": "MOTION",
                "value": "SWEEP",
            })
        );
    }
}
