//! Device and attribute registry.
//!
//! The device exposes a fixed namespace: one servo (`SERVO`), the static
//! flex-sensor controller (`FLEX`), and four flex sensors addressed
//! `FLEX_2` .. `FLEX_5`. Every identifier that crosses the wire is parsed
//! into these closed enums exactly once; unknown tokens are never coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;

// ── Errors ───────────────────────────────────────────────────────────

/// A device identifier that is not part of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown device: {token}")]
pub struct UnknownDevice {
    pub token: String,
}

// ── SensorIndex ──────────────────────────────────────────────────────

/// Index of a physical flex sensor, always within `2..=5`.
///
/// The numbering follows the firmware, which names sensors after the
/// analog pins they were originally wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorIndex(u8);

impl SensorIndex {
    pub const MIN: u8 = 2;
    pub const MAX: u8 = 5;

    /// Returns `None` when `index` is outside `2..=5`.
    pub fn new(index: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&index).then_some(Self(index))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// All sensor indices in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (Self::MIN..=Self::MAX).map(Self)
    }
}

impl fmt::Display for SensorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SensorIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

// ── Device ───────────────────────────────────────────────────────────

/// An addressable unit in the device's attribute namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Device {
    /// The hand actuator.
    Servo,
    /// Class-level flex-sensor controls (sampling rate, start/stop).
    Flex,
    /// One physical flex sensor, `FLEX_n`.
    Sensor(SensorIndex),
}

impl Device {
    /// Every device in wire order: `SERVO`, `FLEX`, `FLEX_2` .. `FLEX_5`.
    pub fn all() -> impl Iterator<Item = Self> {
        [Self::Servo, Self::Flex]
            .into_iter()
            .chain(SensorIndex::all().map(Self::Sensor))
    }

    pub fn sensor_index(self) -> Option<SensorIndex> {
        match self {
            Self::Sensor(index) => Some(index),
            Self::Servo | Self::Flex => None,
        }
    }

    /// The attributes this device understands, in declaration order.
    pub fn attributes(self) -> Vec<Attribute> {
        match self {
            Self::Servo => ServoAttribute::iter().map(Attribute::Servo).collect(),
            Self::Flex => FlexAttribute::iter().map(Attribute::Flex).collect(),
            Self::Sensor(_) => SensorAttribute::iter().map(Attribute::Sensor).collect(),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Servo => f.write_str("SERVO"),
            Self::Flex => f.write_str("FLEX"),
            Self::Sensor(index) => write!(f, "FLEX_{index}"),
        }
    }
}

impl FromStr for Device {
    type Err = UnknownDevice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SERVO" => return Ok(Self::Servo),
            "FLEX" => return Ok(Self::Flex),
            _ => {}
        }

        // Exactly one digit after the underscore: `FLEX_02` and `FLEX_12`
        // are not sensors.
        if let Some(&[digit]) = s.strip_prefix("FLEX_").map(str::as_bytes) {
            if let Some(index) = digit.checked_sub(b'0').and_then(SensorIndex::new) {
                return Ok(Self::Sensor(index));
            }
        }

        Err(UnknownDevice { token: s.into() })
    }
}

impl Serialize for Device {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ── Attributes ───────────────────────────────────────────────────────

/// Servo properties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
    IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServoAttribute {
    /// Current angle, pushed continuously while the servo moves.
    Position,
    AngleStep,
    /// Delay between steps, in microseconds.
    TimeDelay,
    MinPwm,
    MaxPwm,
    Pin,
    /// Enables or disables the motion loop.
    Actuate,
    StartAngle,
    StopAngle,
    /// Motion profile name (select value).
    Motion,
    MaxAngle,
}

/// Controls shared by every flex sensor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
    IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlexAttribute {
    /// Sampling interval in milliseconds.
    SampleRate,
    Start,
    Stop,
}

/// Per-sensor properties.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
    IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorAttribute {
    /// Raw 12-bit ADC reading, pushed at the sampling rate.
    Read,
    /// Analog pin assignment, or `false` when not connected.
    Pin,
}

/// An attribute scoped to the kind of device that owns it.
///
/// Construct through [`Attribute::parse`] to guarantee that the attribute
/// matches its device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    Servo(ServoAttribute),
    Flex(FlexAttribute),
    Sensor(SensorAttribute),
}

impl Attribute {
    /// Resolve `token` against the attribute set of `device`.
    pub fn parse(device: Device, token: &str) -> Option<Self> {
        match device {
            Device::Servo => token.parse().ok().map(Self::Servo),
            Device::Flex => token.parse().ok().map(Self::Flex),
            Device::Sensor(_) => token.parse().ok().map(Self::Sensor),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Servo(attr) => attr.into(),
            Self::Flex(attr) => attr.into(),
            Self::Sensor(attr) => attr.into(),
        }
    }

    /// Whether this attribute is valid for `device`.
    pub fn belongs_to(self, device: Device) -> bool {
        matches!(
            (self, device),
            (Self::Servo(_), Device::Servo)
                | (Self::Flex(_), Device::Flex)
                | (Self::Sensor(_), Device::Sensor(_))
        )
    }

    /// Continuous telemetry that bypasses request/status handling.
    pub fn is_telemetry(self) -> bool {
        matches!(
            self,
            Self::Servo(ServoAttribute::Position) | Self::Sensor(SensorAttribute::Read)
        )
    }

    /// Whether the firmware accepts a SET for this attribute.
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Sensor(SensorAttribute::Read))
    }

    /// Triggers that act on any request and carry no readable state.
    pub fn is_action(self) -> bool {
        matches!(self, Self::Flex(FlexAttribute::Start | FlexAttribute::Stop))
    }

    /// Whether a GET returns a stored setting worth fetching up front.
    pub fn is_queryable(self) -> bool {
        !self.is_telemetry() && !self.is_action()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ── Lookups ──────────────────────────────────────────────────────────

/// Whether `token` names a device in the registry.
pub fn is_known_device(token: &str) -> bool {
    token.parse::<Device>().is_ok()
}

/// Whether `token` names an attribute of `device`.
pub fn is_known_attribute(device: Device, token: &str) -> bool {
    Attribute::parse(device, token).is_some()
}

/// Every device in wire order.
pub fn devices() -> impl Iterator<Item = Device> {
    Device::all()
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(n: u8) -> Device {
        Device::Sensor(SensorIndex::new(n).unwrap())
    }

    #[test]
    fn parses_every_device_name() {
        assert_eq!("SERVO".parse::<Device>().unwrap(), Device::Servo);
        assert_eq!("FLEX".parse::<Device>().unwrap(), Device::Flex);
        for n in 2..=5 {
            assert_eq!(format!("FLEX_{n}").parse::<Device>().unwrap(), sensor(n));
        }
    }

    #[test]
    fn rejects_out_of_range_and_malformed_sensors() {
        for token in ["FLEX_1", "FLEX_6", "FLEX_9", "FLEX_02", "FLEX_", "FLEX_x", "flex_2", ""] {
            assert!(!is_known_device(token), "{token:?} should be unknown");
        }
    }

    #[test]
    fn device_display_round_trips() {
        for device in Device::all() {
            assert_eq!(device.to_string().parse::<Device>().unwrap(), device);
        }
    }

    #[test]
    fn wire_order_of_devices() {
        let names: Vec<String> = devices().map(|d| d.to_string()).collect();
        assert_eq!(
            names,
            ["SERVO", "FLEX", "FLEX_2", "FLEX_3", "FLEX_4", "FLEX_5"]
        );
    }

    #[test]
    fn servo_attribute_names_match_wire_tokens() {
        let names: Vec<&str> = Device::Servo
            .attributes()
            .into_iter()
            .map(Attribute::as_str)
            .collect();
        assert_eq!(
            names,
            [
                "POSITION",
                "ANGLE_STEP",
                "TIME_DELAY",
                "MIN_PWM",
                "MAX_PWM",
                "PIN",
                "ACTUATE",
                "START_ANGLE",
                "STOP_ANGLE",
                "MOTION",
                "MAX_ANGLE",
            ]
        );
    }

    #[test]
    fn attributes_are_scoped_to_their_device() {
        assert!(is_known_attribute(Device::Servo, "MAX_PWM"));
        assert!(is_known_attribute(Device::Flex, "SAMPLE_RATE"));
        assert!(is_known_attribute(sensor(4), "READ"));
        assert!(is_known_attribute(sensor(4), "PIN"));

        assert!(!is_known_attribute(Device::Flex, "READ"));
        assert!(!is_known_attribute(sensor(2), "SAMPLE_RATE"));
        assert!(!is_known_attribute(Device::Servo, "READ"));
        assert!(!is_known_attribute(Device::Servo, "max_pwm"));
    }

    #[test]
    fn pin_resolves_per_device() {
        assert_eq!(
            Attribute::parse(Device::Servo, "PIN"),
            Some(Attribute::Servo(ServoAttribute::Pin))
        );
        assert_eq!(
            Attribute::parse(sensor(3), "PIN"),
            Some(Attribute::Sensor(SensorAttribute::Pin))
        );
        assert_eq!(Attribute::parse(Device::Flex, "PIN"), None);
    }

    #[test]
    fn telemetry_and_writability() {
        assert!(Attribute::Servo(ServoAttribute::Position).is_telemetry());
        assert!(Attribute::Sensor(SensorAttribute::Read).is_telemetry());
        assert!(!Attribute::Sensor(SensorAttribute::Pin).is_telemetry());

        assert!(Attribute::Servo(ServoAttribute::Position).is_writable());
        assert!(!Attribute::Sensor(SensorAttribute::Read).is_writable());
    }

    #[test]
    fn queryable_attributes_skip_telemetry_and_triggers() {
        let queryable: Vec<(String, &str)> = devices()
            .flat_map(|d| d.attributes().into_iter().map(move |a| (d, a)))
            .filter(|(_, a)| a.is_queryable())
            .map(|(d, a)| (d.to_string(), a.as_str()))
            .collect();

        assert_eq!(queryable.len(), 15);
        assert!(queryable.contains(&("FLEX".into(), "SAMPLE_RATE")));
        assert!(queryable.contains(&("FLEX_5".into(), "PIN")));
        assert!(!queryable.contains(&("SERVO".into(), "POSITION")));
        assert!(!queryable.contains(&("FLEX".into(), "START")));
        assert!(!queryable.contains(&("FLEX_2".into(), "READ")));
    }

    #[test]
    fn sensor_index_bounds() {
        assert!(SensorIndex::new(1).is_none());
        assert!(SensorIndex::new(6).is_none());
        assert_eq!(SensorIndex::all().map(SensorIndex::get).collect::<Vec<_>>(), [2, 3, 4, 5]);
    }
}
