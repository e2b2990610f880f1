// exolink-api: wire protocol, registry, and transport for exolink devices

pub mod command;
pub mod error;
pub mod link;
pub mod registry;
pub mod websocket;
pub mod wire;

pub use command::{Command, InvalidCommand, build_command};
pub use error::Error;
pub use link::{Link, LinkSender};
pub use registry::{
    Attribute, Device, FlexAttribute, SensorAttribute, SensorIndex, ServoAttribute,
    UnknownDevice, is_known_attribute, is_known_device,
};
pub use wire::{
    DecodeError, DeviceNotice, Frame, Message, RequestKind, Status, Token, Value, decode, encode,
};
