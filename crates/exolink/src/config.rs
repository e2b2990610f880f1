//! CLI configuration: thin wrapper around `exolink_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --timeout, --no-requery).

use std::time::Duration;

use exolink_core::{RetryPolicy, SessionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use exolink_config::{
    Config, Profile, config_path, load_config, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build a `SessionConfig` from the config file, profile, and CLI overrides.
///
/// CLI flag overrides take priority over profile values.
pub fn build_session_config(global: &GlobalOpts) -> Result<SessionConfig, CliError> {
    let cfg = load_config()?;
    let (_, mut profile) = cfg
        .resolve_profile(global.profile.as_deref())
        .map_err(|_| CliError::ProfileNotFound {
            name: active_profile_name(global, &cfg),
            available: available_profiles(&cfg),
        })?;

    // 1. URL (flag > env > profile)
    if let Some(url) = &global.url {
        profile.url.clone_from(url);
    }

    let mut session = exolink_config::profile_to_session_config(&profile, &cfg.defaults)?;

    // 2. Timeout
    if let Some(secs) = global.timeout {
        session.connect_timeout = Duration::from_secs(secs);
    }

    // 3. Retry policy
    if global.no_requery {
        session.retry_policy = RetryPolicy::Disabled;
    }

    Ok(session)
}
