//! Clap derive structures for the `exolink` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only depends on clap so `build.rs` can include it for man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// exolink -- monitor and control an exoskeleton device over WebSocket
#[derive(Debug, Parser)]
#[command(
    name = "exolink",
    version,
    about = "Monitor and control exolink devices from the command line",
    long_about = "Talks to the device firmware over its WebSocket endpoint.\n\n\
        Streams servo and flex-sensor telemetry, reads and writes settings,\n\
        and re-queries any setting the device refuses to change.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "EXOLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device WebSocket URL (overrides profile)
    #[arg(long, short = 'u', env = "EXOLINK_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "EXOLINK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Connect timeout in seconds (overrides profile)
    #[arg(long, env = "EXOLINK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Do not re-query settings the device rejects
    #[arg(long, global = true)]
    pub no_requery: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON (one object per line when streaming)
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream live events from the device
    #[command(alias = "mon", alias = "m")]
    Monitor(MonitorArgs),

    /// Read one attribute
    Get(GetArgs),

    /// Write one attribute and wait for the device's answer
    Set(SetArgs),

    /// List devices and their attributes (no connection needed)
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Fetch every setting and print the device's current state
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Device commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// Only show events from this device (e.g. SERVO, FLEX_3)
    #[arg(long, short = 'd')]
    pub device: Option<String>,

    /// Stop after this many events
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// Also show acknowledgements and protocol diagnostics
    #[arg(long)]
    pub reports: bool,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Device name (SERVO, FLEX, FLEX_2 .. FLEX_5)
    pub device: String,

    /// Attribute name (e.g. MAX_PWM, SAMPLE_RATE, PIN)
    pub attribute: String,

    /// Seconds to wait for the answer
    #[arg(long, short = 'w', default_value = "5")]
    pub wait: u64,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Device name (SERVO, FLEX, FLEX_2 .. FLEX_5)
    pub device: String,

    /// Attribute name (e.g. MAX_PWM, SAMPLE_RATE, PIN)
    pub attribute: String,

    /// New value: a number, true/false, or text (e.g. a motion name)
    pub value: String,

    /// Seconds to wait for the device to accept or reject
    #[arg(long, short = 'w', default_value = "5")]
    pub wait: u64,
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Only list attributes of this device
    pub device: Option<String>,
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Milliseconds to collect answers after the last request
    #[arg(long, default_value = "1500")]
    pub settle_ms: u64,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with one profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a profile key (url, timeout, history_len, requery_on_reject)
    Set {
        key: String,
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Make a profile the default
    Use { name: String },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
