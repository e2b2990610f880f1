// ── Protocol router ──
//
// Classifies each inbound frame and decides what it becomes: an event,
// an acknowledgement, a re-query, or a dropped frame with a diagnostic.
// Routing is a pure function of the frame and the retry policy; the
// session performs the side effects.

use exolink_api::{
    Attribute, Command, Device, Frame, Message, RequestKind, SensorAttribute, ServoAttribute,
    Status, Token, decode,
};
use serde::{Deserialize, Serialize};

use crate::diagnostic::Diagnostic;
use crate::event::ProtocolEvent;

/// What to do when the device rejects a `SET`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RetryPolicy {
    /// Issue one `GET` for the rejected attribute so consumers resync with
    /// the value the device actually holds.
    #[default]
    RequeryOnReject,
    /// Report the rejection and do nothing else.
    Disabled,
}

/// Outcome of routing one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Event(ProtocolEvent),
    /// `SET` confirmed with `OK`.
    Acknowledged { device: Device, attribute: Attribute },
    /// `SET` rejected; `command` must be sent to the device.
    Requery {
        command: Command,
        diagnostic: Diagnostic,
    },
    Dropped(Diagnostic),
}

impl Dispatch {
    pub fn event(&self) -> Option<&ProtocolEvent> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn command(&self) -> Option<&Command> {
        match self {
            Self::Requery { command, .. } => Some(command),
            _ => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Requery { diagnostic, .. } | Self::Dropped(diagnostic) => Some(diagnostic),
            Self::Event(_) | Self::Acknowledged { .. } => None,
        }
    }
}

/// Stateless message classifier.
#[derive(Debug, Clone, Default)]
pub struct Router {
    policy: RetryPolicy,
}

impl Router {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Decode and route one raw text frame.
    pub fn route_text(&self, raw: &str) -> Dispatch {
        match decode(raw) {
            Ok(frame) => self.route_frame(frame),
            Err(e) => Dispatch::Dropped(Diagnostic::Decode {
                reason: e.to_string(),
            }),
        }
    }

    pub fn route_frame(&self, frame: Frame) -> Dispatch {
        match frame {
            Frame::Message(message) => self.route(&message),
            Frame::Notice(notice) => Dispatch::Dropped(notice.into()),
        }
    }

    /// Route one decoded message.
    ///
    /// Precedence: a missing value drops the message for every device;
    /// servo position and sensor readings are telemetry and emit
    /// regardless of request or status; everything else goes through
    /// request/status handling.
    pub fn route(&self, message: &Message) -> Dispatch {
        let Some(value) = &message.value else {
            return Dispatch::Dropped(Diagnostic::missing_value(message));
        };

        let (Token::Known(device), Token::Known(attribute)) = (&message.device, &message.attribute)
        else {
            return Dispatch::Dropped(Diagnostic::unknown_target(message));
        };
        let (device, attribute) = (*device, *attribute);
        let value = value.clone();

        let tagged = match (device, attribute) {
            (Device::Servo, Attribute::Servo(ServoAttribute::Position)) => {
                return Dispatch::Event(ProtocolEvent::ServoPositionUpdated { position: value });
            }
            (Device::Sensor(sensor), Attribute::Sensor(SensorAttribute::Read)) => {
                return Dispatch::Event(ProtocolEvent::SensorReadingUpdated {
                    sensor,
                    reading: value,
                });
            }
            (Device::Servo, Attribute::Servo(attribute)) => {
                ProtocolEvent::ServoAttributeUpdated { attribute, value }
            }
            (Device::Flex, Attribute::Flex(attribute)) => {
                ProtocolEvent::FlexControlUpdated { attribute, value }
            }
            (Device::Sensor(sensor), Attribute::Sensor(SensorAttribute::Pin)) => {
                ProtocolEvent::SensorPinUpdated { sensor, value }
            }
            // decode resolves attributes per device, so only a hand-built
            // message can pair them wrongly
            _ => return Dispatch::Dropped(Diagnostic::unknown_target(message)),
        };

        match &message.request {
            None | Some(Token::Known(RequestKind::Get)) => Dispatch::Event(tagged),
            Some(Token::Known(RequestKind::Set)) => {
                self.route_set_response(device, attribute, message.status.as_ref())
            }
            Some(Token::Unknown(request)) => Dispatch::Dropped(Diagnostic::UnknownRequest {
                device,
                attribute,
                request: request.clone(),
            }),
        }
    }

    fn route_set_response(
        &self,
        device: Device,
        attribute: Attribute,
        status: Option<&Token<Status>>,
    ) -> Dispatch {
        match status {
            Some(Token::Known(Status::Ok)) => Dispatch::Acknowledged { device, attribute },
            Some(Token::Known(Status::Error)) => {
                let diagnostic = Diagnostic::SetRejected { device, attribute };
                match (self.policy, Command::get(device, attribute)) {
                    (RetryPolicy::RequeryOnReject, Ok(command)) => Dispatch::Requery {
                        command,
                        diagnostic,
                    },
                    _ => Dispatch::Dropped(diagnostic),
                }
            }
            other => Dispatch::Dropped(Diagnostic::MissingStatusOnSet {
                device,
                attribute,
                status: other.map(ToString::to_string),
            }),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
