//! Registry listing. Needs no connection.

use serde::Serialize;
use tabled::Tabled;

use exolink_core::{Attribute, Device};

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AttributeInfo {
    device: Device,
    attribute: Attribute,
    telemetry: bool,
    writable: bool,
    queryable: bool,
}

impl AttributeInfo {
    fn new(device: Device, attribute: Attribute) -> Self {
        Self {
            device,
            attribute,
            telemetry: attribute.is_telemetry(),
            writable: attribute.is_writable(),
            queryable: attribute.is_queryable(),
        }
    }
}

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Attribute")]
    attribute: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Writable")]
    writable: &'static str,
}

fn kind(info: &AttributeInfo) -> &'static str {
    if info.telemetry {
        "telemetry"
    } else if info.attribute.is_action() {
        "action"
    } else {
        "setting"
    }
}

fn row(info: &AttributeInfo) -> AttributeRow {
    AttributeRow {
        device: info.device.to_string(),
        attribute: info.attribute.as_str(),
        kind: kind(info),
        writable: if info.writable { "yes" } else { "no" },
    }
}

fn list(filter: Option<Device>) -> Vec<AttributeInfo> {
    Device::all()
        .filter(|d| filter.is_none_or(|wanted| wanted == *d))
        .flat_map(|device| {
            device
                .attributes()
                .into_iter()
                .map(move |attribute| AttributeInfo::new(device, attribute))
        })
        .collect()
}

pub fn handle(args: &DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let filter = args.device.as_deref().map(util::parse_device).transpose()?;
    let infos = list(filter);

    let out = output::render_list(global.output, &infos, row, |i| {
        format!("{} {}", i.device, i.attribute)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
