//! Shared helpers for command handlers.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use exolink_core::{Attribute, Device, ProtocolEvent, Reading, Session};

use crate::error::CliError;

/// Resolve a device name, case-insensitively.
pub fn parse_device(token: &str) -> Result<Device, CliError> {
    token
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| CliError::UnknownDevice {
            token: token.into(),
            available: Device::all()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Resolve an attribute name against `device`'s attribute set.
pub fn parse_attribute(device: Device, token: &str) -> Result<Attribute, CliError> {
    Attribute::parse(device, &token.to_ascii_uppercase()).ok_or_else(|| {
        CliError::UnknownAttribute {
            device: device.to_string(),
            token: token.into(),
            available: device
                .attributes()
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }
    })
}

/// Open the session's connection.
pub async fn connect(session: &Session) -> Result<(), CliError> {
    session.connect().await?;
    Ok(())
}

/// Wait for the next event carrying `device`/`attribute`, stamped with
/// the time it was received. `None` when the deadline passes first.
pub async fn await_value(
    events: &mut broadcast::Receiver<Arc<ProtocolEvent>>,
    device: Device,
    attribute: Attribute,
    deadline: Instant,
) -> Result<Option<Reading>, CliError> {
    loop {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Err(_) => return Ok(None),
            Ok(Ok(event)) if event.device() == device && event.attribute() == attribute => {
                return Ok(Some(Reading {
                    device,
                    attribute,
                    value: event.value().clone(),
                    updated_at: Utc::now(),
                }));
            }
            Ok(Ok(_)) => {}
            Ok(Err(RecvError::Lagged(skipped))) => {
                tracing::debug!(skipped, "skipped events while waiting");
            }
            Ok(Err(RecvError::Closed)) => return Err(CliError::Disconnected),
        }
    }
}

pub fn deadline_after(seconds: u64) -> Instant {
    Instant::now() + Duration::from_secs(seconds)
}

#[cfg(test)]
mod tests {
    use exolink_core::{SensorAttribute, SensorIndex, ServoAttribute, Value};

    use super::*;

    #[test]
    fn device_names_ignore_case() {
        assert_eq!(parse_device("servo").unwrap(), Device::Servo);
        assert_eq!(
            parse_device("flex_3").unwrap(),
            Device::Sensor(SensorIndex::new(3).unwrap())
        );
    }

    #[test]
    fn unknown_device_lists_the_registry() {
        let err = parse_device("FLEX_9").unwrap_err();
        let CliError::UnknownDevice { available, .. } = err else {
            panic!("expected UnknownDevice, got {err:?}");
        };
        assert_eq!(available, "SERVO, FLEX, FLEX_2, FLEX_3, FLEX_4, FLEX_5");
    }

    #[test]
    fn attributes_resolve_per_device() {
        assert_eq!(
            parse_attribute(Device::Servo, "max_pwm").unwrap(),
            Attribute::Servo(ServoAttribute::MaxPwm)
        );
        let sensor = Device::Sensor(SensorIndex::new(2).unwrap());
        assert_eq!(
            parse_attribute(sensor, "READ").unwrap(),
            Attribute::Sensor(SensorAttribute::Read)
        );
        assert!(matches!(
            parse_attribute(sensor, "MAX_PWM"),
            Err(CliError::UnknownAttribute { .. })
        ));
    }

    #[tokio::test]
    async fn awaited_value_is_stamped_on_receipt() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(Arc::new(ProtocolEvent::ServoAttributeUpdated {
            attribute: ServoAttribute::Pin,
            value: Value::from(4_i64),
        }))
        .unwrap();
        tx.send(Arc::new(ProtocolEvent::ServoAttributeUpdated {
            attribute: ServoAttribute::MaxPwm,
            value: Value::from(2400_i64),
        }))
        .unwrap();

        let before = Utc::now();
        let reading = await_value(
            &mut rx,
            Device::Servo,
            Attribute::Servo(ServoAttribute::MaxPwm),
            deadline_after(1),
        )
        .await
        .unwrap()
        .expect("matching event");
        let after = Utc::now();

        assert_eq!(reading.value, Value::from(2400_i64));
        assert!(before <= reading.updated_at && reading.updated_at <= after);
    }

    #[tokio::test]
    async fn await_value_times_out_without_a_match() {
        let (_tx, mut rx) = broadcast::channel::<Arc<ProtocolEvent>>(8);
        let reading = await_value(
            &mut rx,
            Device::Servo,
            Attribute::Servo(ServoAttribute::Pin),
            Instant::now() + Duration::from_millis(20),
        )
        .await
        .unwrap();
        assert!(reading.is_none());
    }
}
