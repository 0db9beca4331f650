//! Command dispatch: CLI args -> platform operations -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod get;
pub mod motion;
pub mod set;
pub mod watch;

use intesis_core::{CapabilityRegistry, IntesisClient, Unwired};

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

pub type Platform = intesis_core::Platform<IntesisClient>;

/// Log in, fetch the configuration, and build one bridge per unit.
pub async fn connect(
    global: &GlobalOpts,
    registry: &dyn CapabilityRegistry,
) -> Result<Platform, CliError> {
    let bridge_config = config::bridge_config(global)?;
    let platform = Platform::connect(&bridge_config, registry).await?;
    Ok(platform)
}

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(&args, global).await;
    }

    let platform = connect(global, &Unwired).await?;
    let result = match cmd {
        Command::Devices(args) => devices::handle(&platform, args, global),
        Command::Get(args) => get::handle(&platform, &args, global).await,
        Command::Set(args) => set::handle(&platform, &args, global).await,
        // Handled before dispatch
        Command::Watch(_) | Command::Motion(_) | Command::Config(_) | Command::Completions(_) => {
            unreachable!()
        }
    };
    platform.shutdown();
    result
}
