//! Live event stream.

use chrono::Local;
use tokio::sync::broadcast::error::RecvError;

use exolink_core::{ConnectionState, Device, ProtocolEvent, Report, Session};

use crate::cli::{GlobalOpts, MonitorArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output::{self, Palette};

pub async fn handle(
    session: &Session,
    args: &MonitorArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let filter = args.device.as_deref().map(util::parse_device).transpose()?;
    let palette = Palette::new(output::should_color(global.color));

    // Subscribe before connecting so the first pushed frames are seen.
    let mut events = session.events();
    let mut reports = session.reports();
    let mut state = session.connection_state();

    util::connect(session).await?;
    tracing::info!(url = %session.config().url, "monitoring");

    let mut printer = Printer {
        filter,
        palette,
        global,
        count: args.count,
        seen: 0,
    };
    loop {
        // Events and reports come first: the session publishes everything
        // it routed before it flags the link as failed.
        tokio::select! {
            biased;

            event = events.recv() => match event {
                Ok(event) => {
                    if printer.event(&event) {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "output too slow, events dropped");
                }
                Err(RecvError::Closed) => return Err(CliError::Disconnected),
            },

            report = reports.recv(), if args.reports => match report {
                Ok(report) => printer.report(&report),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "output too slow, reports dropped");
                }
                Err(RecvError::Closed) => return Err(CliError::Disconnected),
            },

            changed = state.changed() => {
                if changed.is_err() || *state.borrow() == ConnectionState::Failed {
                    while let Ok(event) = events.try_recv() {
                        if printer.event(&event) {
                            return Ok(());
                        }
                    }
                    if args.reports {
                        while let Ok(report) = reports.try_recv() {
                            printer.report(&report);
                        }
                    }
                    return Err(CliError::Disconnected);
                }
            }

            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Filters and prints stream items, counting events against `--count`.
struct Printer<'a> {
    filter: Option<Device>,
    palette: Palette,
    global: &'a GlobalOpts,
    count: Option<usize>,
    seen: usize,
}

impl Printer<'_> {
    /// Print `event` if it passes the filter. `true` once `--count` is reached.
    fn event(&mut self, event: &ProtocolEvent) -> bool {
        if self.filter.is_some_and(|d| d != event.device()) {
            return false;
        }
        let line = output::render_stream_item(self.global.output, event, |e| {
            event_line(e, &self.palette)
        });
        output::print_output(&line, self.global.quiet);

        self.seen += 1;
        self.count.is_some_and(|n| self.seen >= n)
    }

    fn report(&self, report: &Report) {
        if !report_matches(report, self.filter) {
            return;
        }
        let line = output::render_stream_item(self.global.output, report, |r| {
            report_line(r, &self.palette)
        });
        output::print_output(&line, self.global.quiet);
    }
}

fn report_matches(report: &Report, filter: Option<Device>) -> bool {
    match (report, filter) {
        (_, None) | (Report::Diagnostic(_), _) => true,
        (Report::Acknowledged { device, .. }, Some(wanted)) => *device == wanted,
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}

fn event_line(event: &ProtocolEvent, palette: &Palette) -> String {
    format!(
        "{} {} {} {}",
        Palette::paint(palette.dim, timestamp()),
        Palette::paint(palette.device, event.device()),
        Palette::paint(palette.attribute, event.attribute()),
        Palette::paint(palette.value, event.value()),
    )
}

fn report_line(report: &Report, palette: &Palette) -> String {
    match report {
        Report::Acknowledged { device, attribute } => format!(
            "{} {} {} {}",
            Palette::paint(palette.dim, timestamp()),
            Palette::paint(palette.device, device),
            Palette::paint(palette.attribute, attribute),
            Palette::paint(palette.ok, "accepted"),
        ),
        Report::Diagnostic(diagnostic) => format!(
            "{} {} {}",
            Palette::paint(palette.dim, timestamp()),
            Palette::paint(palette.warn, diagnostic.kind()),
            diagnostic,
        ),
    }
}

#[cfg(test)]
mod tests {
    use exolink_core::{Attribute, Diagnostic, ServoAttribute, Value};

    use super::*;

    #[test]
    fn event_lines_name_device_attribute_and_value() {
        let event = ProtocolEvent::ServoAttributeUpdated {
            attribute: ServoAttribute::MaxPwm,
            value: Value::from(2400_i64),
        };
        let line = event_line(&event, &Palette::new(false));
        assert!(line.ends_with("SERVO MAX_PWM 2400"), "{line}");
    }

    #[test]
    fn device_filter_keeps_diagnostics() {
        let ack = Report::Acknowledged {
            device: Device::Servo,
            attribute: Attribute::Servo(ServoAttribute::Pin),
        };
        let diag = Report::Diagnostic(Diagnostic::Decode {
            reason: "bad".into(),
        });
        assert!(report_matches(&ack, Some(Device::Servo)));
        assert!(!report_matches(&ack, Some(Device::Flex)));
        assert!(report_matches(&diag, Some(Device::Flex)));
    }
}
