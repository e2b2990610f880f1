// exolink-core: protocol routing and live device state between exolink-api and consumers.

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod event;
pub mod router;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SessionConfig;
pub use diagnostic::Diagnostic;
pub use error::CoreError;
pub use event::{EventSink, ProtocolEvent, Report};
pub use router::{Dispatch, RetryPolicy, Router};
pub use session::{ConnectionState, Session};
pub use store::{Reading, Sample, TelemetryStore};

// Registry and command types consumers need to address the device.
pub use exolink_api::{
    Attribute, Command, Device, FlexAttribute, InvalidCommand, RequestKind, SensorAttribute,
    SensorIndex, ServoAttribute, Value,
};
