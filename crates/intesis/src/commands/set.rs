//! `set`: write one capability and print the value the cloud accepted.

use crate::cli::{GlobalOpts, SetArgs};
use crate::error::CliError;
use crate::output;

use super::Platform;
use super::get::CapabilityValue;

pub async fn handle(platform: &Platform, args: &SetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let bridge = platform.bridge(&args.device)?;
    let requested = args.capability.parse_value(&args.value)?;

    tracing::info!(
        device_id = %bridge.device_id(),
        capability = %args.capability,
        value = %requested,
        "setting"
    );
    let accepted = bridge.set(args.capability, requested).await?;

    let out = CapabilityValue {
        device_id: bridge.device_id().to_owned(),
        name: bridge.name().to_owned(),
        capability: args.capability,
        value: accepted,
    }
    .render(global)?;
    output::print_output(&out, global.quiet);
    Ok(())
}
