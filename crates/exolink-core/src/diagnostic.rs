// ── Per-message diagnostics ──
//
// Everything the router can say about a message it did not turn into an
// event. Diagnostics are values, not failures: each one covers exactly
// one inbound frame and the stream carries on.

use exolink_api::{Attribute, Device, DeviceNotice, Message};
use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;

/// A non-fatal protocol problem with one inbound frame.
///
/// Identifiers that may not be in the registry are kept as the raw text
/// the device sent.
#[derive(Debug, Clone, PartialEq, Error, Serialize, IntoStaticStr)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Diagnostic {
    /// The frame was not a well-formed device message.
    #[error("malformed frame: {reason}")]
    Decode { reason: String },

    /// The firmware could not parse something we sent it.
    #[error("device reported an error: {error}{}", details_suffix(details.as_deref()))]
    DeviceNotice {
        error: String,
        details: Option<String>,
    },

    #[error("{device} {attribute}: message carries no value")]
    MissingValue { device: String, attribute: String },

    #[error("unknown device or attribute: {device} {attribute}")]
    UnknownDeviceOrAttribute { device: String, attribute: String },

    #[error("{device} {attribute}: unknown request '{request}'")]
    UnknownRequest {
        device: Device,
        attribute: Attribute,
        request: String,
    },

    /// A `SET` response whose status is absent or not `OK`/`ERROR`.
    #[error("{device} {attribute}: SET response without a valid status{}", status_suffix(status.as_deref()))]
    MissingStatusOnSet {
        device: Device,
        attribute: Attribute,
        status: Option<String>,
    },

    #[error("device rejected SET {device} {attribute}")]
    SetRejected { device: Device, attribute: Attribute },
}

impl Diagnostic {
    /// Stable snake_case name, used as a log field and in CLI output.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub(crate) fn missing_value(message: &Message) -> Self {
        Self::MissingValue {
            device: message.device.to_string(),
            attribute: message.attribute.to_string(),
        }
    }

    pub(crate) fn unknown_target(message: &Message) -> Self {
        Self::UnknownDeviceOrAttribute {
            device: message.device.to_string(),
            attribute: message.attribute.to_string(),
        }
    }
}

impl From<DeviceNotice> for Diagnostic {
    fn from(notice: DeviceNotice) -> Self {
        Self::DeviceNotice {
            error: notice.error,
            details: notice.details,
        }
    }
}

fn details_suffix(details: Option<&str>) -> String {
    details.map(|d| format!(" ({d})")).unwrap_or_default()
}

fn status_suffix(status: Option<&str>) -> String {
    status.map(|s| format!(" (got '{s}')")).unwrap_or_default()
}
