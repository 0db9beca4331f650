//! `watch`: poll the cloud on an interval and print characteristic changes.
//!
//! Every refresh pushes all values to the wired handles; only values that
//! differ from the last one printed are shown.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use intesis_core::{CharacteristicKind, HostValue};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::host::{ChannelRegistry, HostEvent};
use crate::output;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct Change {
    at: DateTime<Utc>,
    device_id: String,
    name: String,
    characteristic: String,
    value: HostValue,
}

/// Remembers the last value printed per characteristic.
#[derive(Default)]
struct ChangeTracker {
    last: HashMap<(String, CharacteristicKind), HostValue>,
}

impl ChangeTracker {
    /// `true` when `event` differs from what was last seen.
    fn observe(&mut self, event: &HostEvent) -> bool {
        let key = (event.accessory.clone(), event.kind);
        if self.last.get(&key) == Some(&event.value) {
            return false;
        }
        self.last.insert(key, event.value);
        true
    }
}

struct Printer {
    format: OutputFormat,
    quiet: bool,
    only: Option<String>,
    names: HashMap<String, String>,
}

impl Printer {
    fn drain(
        &self,
        rx: &mut mpsc::UnboundedReceiver<HostEvent>,
        tracker: &mut ChangeTracker,
    ) -> Result<(), CliError> {
        while let Ok(event) = rx.try_recv() {
            if self.only.as_ref().is_some_and(|id| *id != event.accessory) {
                continue;
            }
            if !tracker.observe(&event) {
                continue;
            }
            let change = Change {
                at: Utc::now(),
                name: self
                    .names
                    .get(&event.accessory)
                    .cloned()
                    .unwrap_or_default(),
                device_id: event.accessory,
                characteristic: event.kind.to_string(),
                value: event.value,
            };
            let line = output::render_single(&self.format, &change, text_line, text_line)?;
            output::print_output(&line, self.quiet);
        }
        Ok(())
    }
}

fn text_line(c: &Change) -> String {
    format!(
        "{} {} {} {}",
        c.at.format("%H:%M:%S"),
        c.name,
        c.characteristic,
        c.value
    )
}

pub async fn handle(args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.interval == Some(0) {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 second".into(),
        });
    }

    let (registry, mut rx) = ChannelRegistry::new();
    let platform = super::connect(global, &registry).await?;

    let only = args
        .device
        .as_deref()
        .map(|d| platform.bridge(d).map(|b| b.device_id().to_owned()))
        .transpose()?;
    let printer = Printer {
        // One record per line for streaming.
        format: match global.output {
            OutputFormat::Json => OutputFormat::JsonCompact,
            ref other => other.clone(),
        },
        quiet: global.quiet,
        only,
        names: platform
            .bridges()
            .iter()
            .map(|b| (b.device_id().to_owned(), b.name().to_owned()))
            .collect(),
    };

    let period = args
        .interval
        .map_or_else(|| platform.cache().ttl(), Duration::from_secs)
        .max(MIN_INTERVAL);
    info!(?period, "watching");

    let mut tracker = ChangeTracker::default();
    // Bridge construction already pushed the initial values.
    printer.drain(&mut rx, &mut tracker)?;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut polls = 0_u64;
    while args.count.is_none_or(|n| polls < n) {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {}
        }
        polls += 1;
        if let Err(e) = platform.cache().refresh(true).await {
            warn!(error = %e, "poll failed, keeping last values");
        }
        printer.drain(&mut rx, &mut tracker)?;
    }

    platform.shutdown();
    Ok(())
}
