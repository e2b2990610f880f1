//! Configuration for exolink tools.
//!
//! TOML profiles, one per device, layered with figment and translated to
//! `exolink_core::SessionConfig`. The CLI applies its own flag overrides
//! on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use exolink_core::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_HISTORY_LEN, DEFAULT_URL};
use exolink_core::{RetryPolicy, SessionConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no profile named '{name}'")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_history_len")]
    pub history_len: usize,

    #[serde(default = "default_requery")]
    pub requery_on_reject: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            history_len: default_history_len(),
            requery_on_reject: default_requery(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}
fn default_history_len() -> usize {
    DEFAULT_HISTORY_LEN
}
fn default_requery() -> bool {
    true
}

/// A named device profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// WebSocket endpoint (e.g., "ws://192.168.4.1/ws").
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_len: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requery_on_reject: Option<bool>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout: None,
            history_len: None,
            requery_on_reject: None,
        }
    }
}

fn default_url() -> String {
    DEFAULT_URL.into()
}

impl Config {
    /// Name of the profile to use when the caller does not pick one.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    /// Look up `name`, or the default profile when `name` is `None`.
    ///
    /// A missing *default* profile is not an error: the built-in
    /// defaults describe the stock firmware access point.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<(String, Profile), ConfigError> {
        let wanted = name.unwrap_or_else(|| self.default_profile_name());
        match self.profiles.get(wanted) {
            Some(profile) => Ok((wanted.to_owned(), profile.clone())),
            None if name.is_none() => Ok((wanted.to_owned(), Profile::default())),
            None => Err(ConfigError::UnknownProfile {
                name: wanted.to_owned(),
            }),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "exolink", "exolink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("exolink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Layer built-in defaults, the TOML file at `path` (if present), and
/// `EXOLINK_` environment variables. Nested keys use a double
/// underscore: `EXOLINK_DEFAULTS__HISTORY_LEN=512`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("EXOLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `SessionConfig` from a profile, falling back to `defaults`
/// for anything the profile leaves unset.
pub fn profile_to_session_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<SessionConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|e| ConfigError::Validation {
        field: "url".into(),
        reason: format!("{e}: {}", profile.url),
    })?;
    if !matches!(url.scheme(), "ws" | "wss") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected a ws:// or wss:// URL, got '{}'", profile.url),
        });
    }

    let retry_policy = if profile
        .requery_on_reject
        .unwrap_or(defaults.requery_on_reject)
    {
        RetryPolicy::RequeryOnReject
    } else {
        RetryPolicy::Disabled
    };

    Ok(SessionConfig {
        url,
        connect_timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        history_len: profile.history_len.unwrap_or(defaults.history_len),
        retry_policy,
    })
}

// ── Tests ───────────────────────────────────────────────────────────
