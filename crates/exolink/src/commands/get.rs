//! One-shot attribute read.

use exolink_core::Session;

use crate::cli::{GetArgs, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(session: &Session, args: &GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let device = util::parse_device(&args.device)?;
    let attribute = util::parse_attribute(device, &args.attribute)?;

    let mut events = session.events();
    util::connect(session).await?;

    // Telemetry arrives on its own; asking would only add a frame.
    if !attribute.is_telemetry() {
        session.get(device, attribute)?;
    }

    let deadline = util::deadline_after(args.wait);
    let Some(reading) = util::await_value(&mut events, device, attribute, deadline).await? else {
        return Err(CliError::NoResponse {
            device: device.to_string(),
            attribute: attribute.to_string(),
            seconds: args.wait,
        });
    };

    let out = output::render_single(
        global.output,
        &reading,
        |r| format!("{} {} = {}", r.device, r.attribute, r.value),
        |r| r.value.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
