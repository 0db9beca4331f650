//! `motion`: run the debounce/fuse filter over raw events from stdin.
//!
//! Each input line is one raw reading (`1`/`0`, `on`/`off`, `true`/`false`).
//! Stable output changes are printed as the filter emits them; at end of
//! input a pending stop is allowed to fire before exiting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use intesis_core::{HostValue, MotionPhase, MotionSensor};

use crate::cli::{GlobalOpts, MotionArgs};
use crate::config;
use crate::error::CliError;
use crate::host::{ChannelRegistry, HostEvent};
use crate::output;

const DEFAULT_NAME: &str = "Motion Sensor";

#[derive(Debug, Serialize)]
struct MotionOutput {
    at: DateTime<Utc>,
    sensor: String,
    detected: bool,
}

fn parse_raw(line: &str) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "1" | "on" | "true" | "yes" | "motion" | "detected" => Some(true),
        "0" | "off" | "false" | "no" | "clear" | "none" => Some(false),
        _ => None,
    }
}

fn print_event(event: HostEvent, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    let HostValue::Detected(detected) = event.value else {
        return Ok(());
    };
    let out = MotionOutput {
        at: Utc::now(),
        sensor: event.accessory,
        detected,
    };
    let rendered = output::render_single(
        &global.output,
        &out,
        |o| {
            let state = if o.detected { "motion detected" } else { "clear" };
            format!(
                "{} {} {}",
                o.at.format("%H:%M:%S%.3f"),
                o.sensor,
                output::paint_state(state, o.detected, color)
            )
        },
        |o| o.detected.to_string(),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

pub async fn handle(args: &MotionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::resolve(global)?;
    let timings = config::motion_timings(&mut cfg, args)?;
    let name = args
        .name
        .clone()
        .or(cfg.motion.name)
        .unwrap_or_else(|| DEFAULT_NAME.to_owned());
    let color = output::should_color(&global.color);

    let (registry, mut events) = ChannelRegistry::new();
    let sensor = MotionSensor::new(name, timings, &registry);
    info!(sensor = %sensor.name(), ?timings, "motion filter ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_raw(&line) {
                    Some(raw) => {
                        let transition = sensor.update(raw);
                        info!(raw, %transition, "raw event");
                    }
                    None => warn!(input = %line.trim(), "not a motion reading, ignored"),
                }
            }
            Some(event) = events.recv() => print_event(event, global, color)?,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    // Let a queued stop land so the last state printed is the settled one.
    if sensor.filter().phase() == MotionPhase::StopPending {
        let mut stable = sensor.filter().subscribe();
        let _ = stable.wait_for(|detected| !*detected).await;
    }
    while let Ok(event) = events.try_recv() {
        print_event(event, global, color)?;
    }
    Ok(())
}
