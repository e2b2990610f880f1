//! Full settings snapshot: query everything, collect answers, print.

use std::time::Duration;

use tabled::Tabled;

use exolink_core::{Reading, Session};

use crate::cli::{GlobalOpts, SnapshotArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Attribute")]
    attribute: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn row(r: &Reading) -> ReadingRow {
    ReadingRow {
        device: r.device.to_string(),
        attribute: r.attribute.as_str(),
        value: r.value.to_string(),
        updated: r
            .updated_at
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S%.3f")
            .to_string(),
    }
}

pub async fn handle(
    session: &Session,
    args: &SnapshotArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::connect(session).await?;

    let issued = session.query_all()?;
    tracing::debug!(issued, settle_ms = args.settle_ms, "waiting for answers");
    tokio::time::sleep(Duration::from_millis(args.settle_ms)).await;

    let readings = session.store().snapshot();
    if readings.is_empty() {
        tracing::warn!("device answered none of {issued} requests");
    }

    let out = output::render_list(global.output, &readings, row, |r| {
        format!("{} {} {}", r.device, r.attribute, r.value)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
