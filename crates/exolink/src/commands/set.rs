//! Attribute write with acknowledgement tracking.
//!
//! Sends one `SET` and waits for the device to accept or reject it. On a
//! rejection the session re-queries the attribute, so the value the
//! device kept is reported alongside the error.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;

use exolink_core::{Attribute, Device, Diagnostic, Report, RetryPolicy, Session, Value};

use crate::cli::{GlobalOpts, SetArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Accepted {
    device: Device,
    attribute: Attribute,
    value: Value,
}

/// How the device answered a `SET`.
enum Outcome {
    Accepted,
    Rejected,
    Failed(Diagnostic),
}

pub async fn handle(session: &Session, args: &SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let device = util::parse_device(&args.device)?;
    let attribute = util::parse_attribute(device, &args.attribute)?;
    if !attribute.is_writable() {
        return Err(CliError::Validation {
            field: attribute.to_string(),
            reason: format!("{device} {attribute} is read-only"),
        });
    }
    let value = Value::infer(&args.value);

    let mut events = session.events();
    let mut reports = session.reports();
    util::connect(session).await?;

    session.set(device, attribute, value.clone())?;

    let deadline = util::deadline_after(args.wait);
    match await_outcome(&mut reports, device, attribute, deadline).await? {
        Some(Outcome::Accepted) => {
            let accepted = Accepted {
                device,
                attribute,
                value,
            };
            let out = output::render_single(
                global.output,
                &accepted,
                |a| format!("{} {} set to {}", a.device, a.attribute, a.value),
                |a| a.value.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
        Some(Outcome::Rejected) => {
            let current = if session.config().retry_policy == RetryPolicy::Disabled {
                None
            } else {
                util::await_value(&mut events, device, attribute, deadline).await?
            };
            Err(CliError::Rejected {
                device: device.to_string(),
                attribute: attribute.to_string(),
                current: current.map_or_else(|| "unknown".into(), |r| r.value.to_string()),
            })
        }
        Some(Outcome::Failed(diagnostic)) => Err(CliError::DeviceError {
            message: diagnostic.to_string(),
        }),
        None => Err(CliError::NoResponse {
            device: device.to_string(),
            attribute: attribute.to_string(),
            seconds: args.wait,
        }),
    }
}

/// Wait for the report that settles this `SET`. `None` on timeout.
async fn await_outcome(
    reports: &mut broadcast::Receiver<Arc<Report>>,
    device: Device,
    attribute: Attribute,
    deadline: Instant,
) -> Result<Option<Outcome>, CliError> {
    loop {
        let report = match tokio::time::timeout_at(deadline, reports.recv()).await {
            Err(_) => return Ok(None),
            Ok(Ok(report)) => report,
            Ok(Err(RecvError::Lagged(skipped))) => {
                tracing::debug!(skipped, "skipped reports while waiting");
                continue;
            }
            Ok(Err(RecvError::Closed)) => return Err(CliError::Disconnected),
        };
        if let Some(outcome) = settle(&report, device, attribute) {
            return Ok(Some(outcome));
        }
    }
}

/// Decide whether `report` answers the `SET` of `device`/`attribute`.
fn settle(report: &Report, device: Device, attribute: Attribute) -> Option<Outcome> {
    let ours = |d: &Device, a: &Attribute| *d == device && *a == attribute;
    match report {
        Report::Acknowledged {
            device: d,
            attribute: a,
        } if ours(d, a) => Some(Outcome::Accepted),
        Report::Diagnostic(Diagnostic::SetRejected {
            device: d,
            attribute: a,
        }) if ours(d, a) => Some(Outcome::Rejected),
        Report::Diagnostic(
            diagnostic @ Diagnostic::MissingStatusOnSet {
                device: d,
                attribute: a,
                ..
            },
        ) if ours(d, a) => Some(Outcome::Failed(diagnostic.clone())),
        Report::Diagnostic(diagnostic @ Diagnostic::DeviceNotice { .. }) => {
            Some(Outcome::Failed(diagnostic.clone()))
        }
        _ => None,
    }
}
