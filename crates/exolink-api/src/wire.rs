//! Wire codec for device messages and commands.
//!
//! Every frame is a single JSON object. Inbound messages carry
//! `dev`, `req`, `attr`, `val`, and `stat`; outbound commands carry
//! `dev`, `req`, `attr`, and `val` only when the request is a `SET`.
//!
//! ```text
//! <- {"dev":"FLEX_3","attr":"READ","val":812}
//! <- {"dev":"SERVO","req":"SET","attr":"MAX_PWM","val":2400,"stat":"ERROR"}
//! -> {"dev":"SERVO","req":"GET","attr":"MAX_PWM"}
//! ```
//!
//! Decoding is purely syntactic: identifiers are resolved against the
//! registry but unknown ones are preserved as [`Token::Unknown`] so the
//! router can report them.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::command::Command;
use crate::registry::{Attribute, Device};

// ── Errors ───────────────────────────────────────────────────────────

/// Failure to turn raw text into a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not JSON, not an object, or missing a required string field.
    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },
}

// ── Scalar vocabulary ────────────────────────────────────────────────

/// Request kind of a message or command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    Get,
    Set,
}

/// Outcome the device reports for a `SET`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ok,
    Error,
}

/// A parsed identifier, or the raw text when it is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<T> {
    Known(T),
    Unknown(String),
}

impl<T> Token<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unknown(_) => None,
        }
    }
}

impl<T: std::str::FromStr> Token<T> {
    fn parse(raw: String) -> Self {
        raw.parse().map_or(Self::Unknown(raw), Self::Known)
    }
}

impl<T: fmt::Display> fmt::Display for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => value.fmt(f),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

// ── Value ────────────────────────────────────────────────────────────

/// Payload of the `val` field.
///
/// Numbers cover servo and sensor fields; strings cover select values
/// such as `MOTION`; booleans cover `ACTUATE` and the "not connected"
/// pin marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Value {
    /// Interpret operator input: `true`/`false` become booleans, anything
    /// numeric becomes a number, everything else stays text.
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        if let Ok(n) = raw.parse::<i64>() {
            return Self::Number(n.into());
        }
        raw.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| Self::Text(raw.into()), Self::Number)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bool(_) | Self::Number(_) => None,
        }
    }

    /// The firmware reports a detached pin as `false`; the browser UI sent
    /// the string `"false"` for the same thing.
    pub fn is_not_connected(&self) -> bool {
        match self {
            Self::Bool(b) => !b,
            Self::Text(s) => s == "false",
            Self::Number(_) => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => b.fmt(f),
            Self::Number(n) => n.fmt(f),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

// ── Frames ───────────────────────────────────────────────────────────

/// A decoded device message. Lives for one decode-dispatch cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub device: Token<Device>,
    pub request: Option<Token<RequestKind>>,
    pub attribute: Token<Attribute>,
    pub value: Option<Value>,
    pub status: Option<Token<Status>>,
}

/// The firmware's reply to a request it could not parse at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceNotice {
    pub error: String,
    pub details: Option<String>,
}

/// Anything the device can send.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Message(Message),
    Notice(DeviceNotice),
}

#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(default)]
    dev: Option<String>,
    #[serde(default)]
    req: Option<String>,
    #[serde(default)]
    attr: Option<String>,
    #[serde(default)]
    val: Option<Value>,
    #[serde(default)]
    stat: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Serialize)]
struct RawCommand<'a> {
    dev: Device,
    req: RequestKind,
    attr: Attribute,
    #[serde(skip_serializing_if = "Option::is_none")]
    val: Option<&'a Value>,
}

// ── Codec ────────────────────────────────────────────────────────────

/// Decode one text frame.
///
/// A JSON `null` in `val` counts as absent, matching the firmware's own
/// `isNull()` checks.
pub fn decode(raw: &str) -> Result<Frame, DecodeError> {
    let frame: RawFrame =
        serde_json::from_str(raw).map_err(|e| DecodeError::MalformedPayload {
            reason: e.to_string(),
        })?;

    if frame.dev.is_none() && frame.attr.is_none() {
        if let Some(error) = frame.error {
            return Ok(Frame::Notice(DeviceNotice {
                error,
                details: frame.details,
            }));
        }
    }

    let dev = frame.dev.ok_or_else(|| missing("dev"))?;
    let attr = frame.attr.ok_or_else(|| missing("attr"))?;

    let device = Token::<Device>::parse(dev);
    let attribute = match device.known() {
        Some(&d) => Attribute::parse(d, &attr).map_or(Token::Unknown(attr), Token::Known),
        None => Token::Unknown(attr),
    };

    Ok(Frame::Message(Message {
        device,
        request: frame.req.map(Token::parse),
        attribute,
        value: frame.val,
        status: frame.stat.map(Token::parse),
    }))
}

/// Encode a command as a single JSON object with fields in
/// `dev, req, attr, val` order.
pub fn encode(command: &Command) -> String {
    let raw = RawCommand {
        dev: command.device(),
        req: command.request(),
        attr: command.attribute(),
        val: command.value(),
    };
    serde_json::to_string(&raw).expect("command serialization should not fail")
}

fn missing(field: &str) -> DecodeError {
    DecodeError::MalformedPayload {
        reason: format!("missing string field `{field}`"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
