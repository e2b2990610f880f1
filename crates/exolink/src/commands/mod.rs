//! Command dispatch: bridges CLI args -> session commands -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod get;
pub mod monitor;
pub mod set;
pub mod snapshot;
pub mod util;

use exolink_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Monitor(args) => monitor::handle(session, &args, global).await,
        Command::Get(args) => get::handle(session, &args, global).await,
        Command::Set(args) => set::handle(session, &args, global).await,
        Command::Snapshot(args) => snapshot::handle(session, &args, global).await,
        // Handled before a session exists
        Command::Devices(_) | Command::Config(_) | Command::Completions(_) => Err(
            CliError::Internal("command does not need a device connection".into()),
        ),
    }
}
