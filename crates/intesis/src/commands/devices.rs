//! Device command handlers.

use std::collections::BTreeMap;

use serde::Serialize;
use tabled::Tabled;

use intesis_core::{
    Capability, CloudApi, DeviceBridge, HostValue, ServiceId, ServiceState, TemperatureBounds,
};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::Platform;

// ── Views ───────────────────────────────────────────────────────────

/// Host-domain view of one unit, as printed by `devices`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceView {
    pub device_id: String,
    pub name: String,
    pub power: Option<bool>,
    pub mode: Option<String>,
    pub fan_speed: Option<u8>,
    pub setpoint: Option<f64>,
    pub current_temperature: Option<f64>,
    pub bounds: TemperatureBounds,
}

impl DeviceView {
    pub fn from_bridge<A: CloudApi>(bridge: &DeviceBridge<A>) -> Self {
        let temperature = |capability: Capability| match bridge.read(capability) {
            Some(HostValue::Temperature(t)) => Some(t),
            _ => None,
        };
        Self {
            device_id: bridge.device_id().to_owned(),
            name: bridge.name().to_owned(),
            power: match bridge.read(Capability::Power) {
                Some(HostValue::Active(a)) => Some(a.is_active()),
                _ => None,
            },
            mode: bridge.read(Capability::Mode).map(|m| m.to_string()),
            fan_speed: match bridge.read(Capability::FanSpeed) {
                Some(HostValue::FanLevel(level)) => Some(level),
                _ => None,
            },
            setpoint: temperature(Capability::HeatingThreshold),
            current_temperature: temperature(Capability::CurrentTemperature),
            bounds: bridge.bounds(),
        }
    }
}

/// `devices show` adds the raw service table.
#[derive(Debug, Serialize)]
struct DeviceDetail {
    #[serde(flatten)]
    view: DeviceView,
    services: BTreeMap<ServiceId, ServiceState>,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Fan")]
    fan: String,
    #[tabled(rename = "Setpoint")]
    setpoint: String,
    #[tabled(rename = "Current")]
    current: String,
}

fn dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

fn celsius(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |t| format!("{t:.1} °C"))
}

fn row(view: &DeviceView, color: bool) -> DeviceRow {
    DeviceRow {
        id: view.device_id.clone(),
        name: view.name.clone(),
        power: view.power.map_or_else(
            || "-".into(),
            |on| output::paint_state(if on { "on" } else { "off" }, on, color),
        ),
        mode: dash(view.mode.as_deref()),
        fan: dash(view.fan_speed),
        setpoint: celsius(view.setpoint),
        current: celsius(view.current_temperature),
    }
}

fn detail(d: &DeviceDetail, color: bool) -> String {
    let v = &d.view;
    let mut lines = vec![
        format!("{}       {}", output::label("ID:", color), v.device_id),
        format!("{}     {}", output::label("Name:", color), v.name),
        format!(
            "{}    {}",
            output::label("Power:", color),
            dash(v.power.map(|on| if on { "on" } else { "off" }))
        ),
        format!("{}     {}", output::label("Mode:", color), dash(v.mode.as_deref())),
        format!("{}      {}", output::label("Fan:", color), dash(v.fan_speed)),
        format!(
            "{} {} (range {}..{}, step {})",
            output::label("Setpoint:", color),
            celsius(v.setpoint),
            v.bounds.min,
            v.bounds.max,
            v.bounds.step
        ),
        format!(
            "{}  {}",
            output::label("Current:", color),
            celsius(v.current_temperature)
        ),
        String::new(),
        output::label("Services:", color),
    ];
    for (id, state) in &d.services {
        lines.push(format!("  {id} = {}", state.value));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(platform: &Platform, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        DevicesCommand::List => {
            let views: Vec<DeviceView> = platform
                .bridges()
                .iter()
                .map(|b| DeviceView::from_bridge(b.as_ref()))
                .collect();
            let out = output::render_list(
                &global.output,
                &views,
                |v| row(v, color),
                |v| format!("{}\t{}", v.device_id, v.name),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Show { device } => {
            let bridge = platform.bridge(&device)?;
            let detail_view = DeviceDetail {
                view: DeviceView::from_bridge(bridge.as_ref()),
                services: bridge.record().services.clone(),
            };
            let out = output::render_single(
                &global.output,
                &detail_view,
                |d| detail(d, color),
                |d| d.view.device_id.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
