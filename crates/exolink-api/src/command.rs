//! Outbound commands.
//!
//! A [`Command`] can only be built through [`Command::build`] (or the
//! `get`/`set` shorthands), which enforces the wire invariant: `val` is
//! present if and only if the request is a `SET`.

use serde::Serialize;
use thiserror::Error;

use crate::registry::{Attribute, Device};
use crate::wire::{self, RequestKind, Value};

/// Construction-time violation of the command schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidCommand {
    #[error("SET {device} {attribute} requires a value")]
    MissingValue { device: Device, attribute: Attribute },

    #[error("GET {device} {attribute} must not carry a value (got {value})")]
    UnexpectedValue {
        device: Device,
        attribute: Attribute,
        value: Value,
    },

    #[error("{attribute} is not an attribute of {device}")]
    AttributeMismatch { device: Device, attribute: Attribute },
}

/// A validated request to the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    device: Device,
    request: RequestKind,
    attribute: Attribute,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl Command {
    pub fn build(
        device: Device,
        request: RequestKind,
        attribute: Attribute,
        value: Option<Value>,
    ) -> Result<Self, InvalidCommand> {
        if !attribute.belongs_to(device) {
            return Err(InvalidCommand::AttributeMismatch { device, attribute });
        }

        match (request, value) {
            (RequestKind::Set, None) => Err(InvalidCommand::MissingValue { device, attribute }),
            (RequestKind::Get, Some(value)) => Err(InvalidCommand::UnexpectedValue {
                device,
                attribute,
                value,
            }),
            (request, value) => Ok(Self {
                device,
                request,
                attribute,
                value,
            }),
        }
    }

    pub fn get(device: Device, attribute: Attribute) -> Result<Self, InvalidCommand> {
        Self::build(device, RequestKind::Get, attribute, None)
    }

    pub fn set(
        device: Device,
        attribute: Attribute,
        value: impl Into<Value>,
    ) -> Result<Self, InvalidCommand> {
        Self::build(device, RequestKind::Set, attribute, Some(value.into()))
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn request(&self) -> RequestKind {
        self.request
    }

    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Wire text for this command.
    pub fn encode(&self) -> String {
        wire::encode(self)
    }
}

/// Free-function form of [`Command::build`].
pub fn build_command(
    device: Device,
    request: RequestKind,
    attribute: Attribute,
    value: Option<Value>,
) -> Result<Command, InvalidCommand> {
    Command::build(device, request, attribute, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FlexAttribute, SensorAttribute, SensorIndex, ServoAttribute};

    const MAX_PWM: Attribute = Attribute::Servo(ServoAttribute::MaxPwm);

    #[test]
    fn set_requires_value() {
        let err = build_command(Device::Servo, RequestKind::Set, MAX_PWM, None).unwrap_err();
        assert_eq!(
            err,
            InvalidCommand::MissingValue {
                device: Device::Servo,
                attribute: MAX_PWM
            }
        );
    }

    #[test]
    fn get_rejects_value() {
        let err = build_command(
            Device::Servo,
            RequestKind::Get,
            MAX_PWM,
            Some(Value::from(1_i64)),
        )
        .unwrap_err();
        assert!(matches!(err, InvalidCommand::UnexpectedValue { .. }));
    }

    #[test]
    fn attribute_must_belong_to_device() {
        let err = Command::get(Device::Flex, Attribute::Sensor(SensorAttribute::Read)).unwrap_err();
        assert!(matches!(err, InvalidCommand::AttributeMismatch { .. }));
        assert_eq!(err.to_string(), "READ is not an attribute of FLEX");
    }

    #[test]
    fn valid_commands() {
        let get = Command::get(Device::Flex, Attribute::Flex(FlexAttribute::SampleRate)).unwrap();
        assert_eq!(get.request(), RequestKind::Get);
        assert!(get.value().is_none());

        let sensor = Device::Sensor(SensorIndex::new(2).unwrap());
        let set = Command::set(sensor, Attribute::Sensor(SensorAttribute::Pin), 34_i64).unwrap();
        assert_eq!(set.request(), RequestKind::Set);
        assert_eq!(set.value(), Some(&Value::from(34_i64)));
    }
}
