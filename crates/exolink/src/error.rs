//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use exolink_config::ConfigError;
use exolink_core::{CoreError, InvalidCommand};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to device at {url}")]
    #[diagnostic(
        code(exolink::connection_failed),
        help(
            "Check that you are joined to the device's access point and that\n\
             the firmware is running.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Device closed the connection")]
    #[diagnostic(code(exolink::disconnected))]
    Disconnected,

    #[error("Timed out after {seconds}s")]
    #[diagnostic(
        code(exolink::timeout),
        help("Increase the limit with --timeout or check that the device is reachable.")
    )]
    Timeout { seconds: u64 },

    // ── Device answers ───────────────────────────────────────────────
    #[error("No answer for {device} {attribute} within {seconds}s")]
    #[diagnostic(
        code(exolink::no_response),
        help("The device may be busy; retry with a longer --wait.")
    )]
    NoResponse {
        device: String,
        attribute: String,
        seconds: u64,
    },

    #[error("Device rejected SET {device} {attribute}")]
    #[diagnostic(
        code(exolink::rejected),
        help("The value is out of range for this attribute. Current value: {current}")
    )]
    Rejected {
        device: String,
        attribute: String,
        current: String,
    },

    #[error("Device reported an error: {message}")]
    #[diagnostic(code(exolink::device_error))]
    DeviceError { message: String },

    // ── Addressing ───────────────────────────────────────────────────
    #[error("Unknown device '{token}'")]
    #[diagnostic(
        code(exolink::unknown_device),
        help("Valid devices: {available}\nRun: exolink devices")
    )]
    UnknownDevice { token: String, available: String },

    #[error("'{token}' is not an attribute of {device}")]
    #[diagnostic(
        code(exolink::unknown_attribute),
        help("Attributes of {device}: {available}")
    )]
    UnknownAttribute {
        device: String,
        token: String,
        available: String,
    },

    #[error(transparent)]
    #[diagnostic(code(exolink::invalid_command))]
    InvalidCommand(#[from] InvalidCommand),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(exolink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(exolink::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: exolink config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(exolink::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(exolink::config))]
    Config(ConfigError),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(code(exolink::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::Timeout { .. } | Self::NoResponse { .. } => exit_code::TIMEOUT,
            Self::Rejected { .. } | Self::DeviceError { .. } => exit_code::REJECTED,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::UnknownDevice { .. }
            | Self::UnknownAttribute { .. }
            | Self::InvalidCommand(_)
            | Self::Validation { .. }
            | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::Config(_) | Self::Internal(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::DeviceDisconnected => Self::Disconnected,
            CoreError::InvalidCommand(e) => Self::InvalidCommand(e),
            CoreError::Config { message } => Self::Validation {
                field: "url".into(),
                reason: message,
            },
            CoreError::NotConnected | CoreError::AlreadyConnected => Self::Internal(err.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::from(CoreError::DeviceDisconnected).exit_code(), 7);
        assert_eq!(
            CliError::from(CoreError::Timeout { timeout_secs: 3 }).exit_code(),
            exit_code::TIMEOUT
        );
        assert_eq!(
            CliError::UnknownDevice {
                token: "FLEX_9".into(),
                available: String::new(),
            }
            .exit_code(),
            exit_code::USAGE
        );
        assert_eq!(
            CliError::from(ConfigError::UnknownProfile { name: "lab".into() }).exit_code(),
            exit_code::NOT_FOUND
        );
    }
}
