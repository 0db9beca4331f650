//! CLI configuration: thin wrapper around `intesis_config`.
//!
//! Loads the file + environment layers and applies `GlobalOpts` flag
//! overrides (--username, --api-base-url, ...) on top.

use intesis_core::{BridgeConfig, MotionTimings};

use crate::cli::{GlobalOpts, MotionArgs};
use crate::error::CliError;

pub use intesis_config::{Config, ConfigError, config_path, load_config};

/// Load the config and apply flag overrides.
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut config = load_config(global.config.as_deref())?;

    if let Some(ref url) = global.api_base_url {
        config.api_base_url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        config.username = Some(username.clone());
    }
    if let Some(ref password) = global.password {
        config.password = Some(password.clone());
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }
    Ok(config)
}

/// Build the runtime bridge config from file, env, and flags.
pub fn bridge_config(global: &GlobalOpts) -> Result<BridgeConfig, CliError> {
    let config = resolve(global)?;
    config.to_bridge_config().map_err(|err| match err {
        ConfigError::Missing { field } => CliError::NoCredentials {
            field,
            path: global
                .config
                .clone()
                .unwrap_or_else(config_path)
                .display()
                .to_string(),
        },
        other => other.into(),
    })
}

/// Motion timings: flags first, then the `[motion]` table.
pub fn motion_timings(config: &mut Config, args: &MotionArgs) -> Result<MotionTimings, CliError> {
    if let Some(ms) = args.stop_delay_ms {
        config.motion.stop_delay_ms = Some(ms);
    }
    if let Some(ms) = args.start_after_stop_fuse_ms {
        config.motion.start_after_stop_fuse_ms = Some(ms);
    }
    config.motion_timings().ok_or_else(|| CliError::Validation {
        field: "motion".into(),
        reason: "stopDelayMs and startAfterStopFuseMs are both required \
                 (--stop-delay-ms / --start-after-stop-fuse-ms or the [motion] table)"
            .into(),
    })
}
