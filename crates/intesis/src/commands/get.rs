//! `get`: read one capability through the cache.

use serde::Serialize;

use intesis_core::{Capability, HostValue};

use crate::cli::{GetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Platform;

/// One capability value, shared by `get` and `set` output.
#[derive(Debug, Serialize)]
pub struct CapabilityValue {
    pub device_id: String,
    pub name: String,
    pub capability: Capability,
    pub value: HostValue,
}

impl CapabilityValue {
    pub fn render(&self, global: &GlobalOpts) -> Result<String, CliError> {
        output::render_single(
            &global.output,
            self,
            |v| format!("{} {}: {}", v.name, v.capability, v.value),
            |v| v.value.to_string(),
        )
    }
}

pub async fn handle(platform: &Platform, args: &GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let bridge = platform.bridge(&args.device)?;
    let value = bridge
        .get(args.capability)
        .await?
        .ok_or_else(|| CliError::Validation {
            field: args.capability.to_string(),
            reason: format!("not reported by '{}'", bridge.name()),
        })?;

    let out = CapabilityValue {
        device_id: bridge.device_id().to_owned(),
        name: bridge.name().to_owned(),
        capability: args.capability,
        value,
    }
    .render(global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
