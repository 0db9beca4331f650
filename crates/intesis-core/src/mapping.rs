// ── Value mapping ──
//
// Stateless translation between remote service values and host
// characteristic values. Every function is total: unrecognized input maps
// to a fixed default instead of failing.

use serde::Serialize;
use serde_json::Value;

use crate::model::ServiceBounds;

// ── Fan speed ───────────────────────────────────────────────────────

/// Remote fan speed names, indexed by host level. Index 0 has no host
/// equivalent and is never written.
pub const FAN_SPEEDS: [&str; 5] = [
    "",
    "position-one",
    "position-two",
    "position-three",
    "position-four",
];

/// Highest host fan level.
pub const MAX_FAN_LEVEL: u8 = 4;

/// Remote fan speed name → host level (0 for anything unrecognized).
pub fn fan_speed_to_host(remote: &Value) -> u8 {
    let Some(name) = remote.as_str() else {
        return 0;
    };
    FAN_SPEEDS
        .iter()
        .position(|candidate| !candidate.is_empty() && *candidate == name)
        .and_then(|idx| u8::try_from(idx).ok())
        .unwrap_or(0)
}

/// Host level → remote fan speed name. Levels outside 1..=4 are clamped,
/// so the empty name is never produced.
pub fn fan_speed_to_remote(level: u8) -> &'static str {
    let idx = usize::from(level.clamp(1, MAX_FAN_LEVEL));
    FAN_SPEEDS.get(idx).copied().unwrap_or("position-one")
}

// ── User mode ───────────────────────────────────────────────────────

/// Host-side heater/cooler target state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HostMode {
    Auto,
    Heat,
    Cool,
}

impl HostMode {
    /// Numeric host encoding (`AUTO = 0`, `HEAT = 1`, `COOL = 2`).
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Auto => 0,
            Self::Heat => 1,
            Self::Cool => 2,
        }
    }

    /// Decode the numeric host encoding; unknown values become `Auto`.
    pub fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Heat,
            2 => Self::Cool,
            _ => Self::Auto,
        }
    }
}

/// Host mode → remote mode string.
pub fn mode_to_remote(mode: HostMode) -> &'static str {
    match mode {
        HostMode::Heat => "heat",
        HostMode::Cool => "cool",
        HostMode::Auto => "auto",
    }
}

/// Remote mode → host mode. `dry`, `fan`, and anything unknown fold into
/// `Auto`; writing that back sends `auto`, not the original value.
pub fn mode_to_host(remote: &Value) -> HostMode {
    match remote.as_str() {
        Some("heat") => HostMode::Heat,
        Some("cool") => HostMode::Cool,
        _ => HostMode::Auto,
    }
}

// ── Power ───────────────────────────────────────────────────────────

/// Host-side two-valued activity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Activity {
    Inactive,
    Active,
}

impl Activity {
    pub fn from_bool(on: bool) -> Self {
        if on { Self::Active } else { Self::Inactive }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Remote power value → host activity. Booleans, non-zero numbers, and
/// `"on"`/`"true"` strings are active; everything else is inactive.
pub fn power_to_host(remote: &Value) -> Activity {
    let on = match remote {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "on" | "true" | "1"),
        _ => false,
    };
    Activity::from_bool(on)
}

pub fn power_to_remote(activity: Activity) -> Value {
    Value::Bool(activity.is_active())
}

// ── Temperature ─────────────────────────────────────────────────────

pub const DEFAULT_MIN_TEMPERATURE: f64 = 10.0;
pub const DEFAULT_MAX_TEMPERATURE: f64 = 35.0;
pub const DEFAULT_TEMPERATURE_STEP: f64 = 1.0;

/// Resolved setpoint range with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for TemperatureBounds {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_TEMPERATURE,
            max: DEFAULT_MAX_TEMPERATURE,
            step: DEFAULT_TEMPERATURE_STEP,
        }
    }
}

impl From<&ServiceBounds> for TemperatureBounds {
    fn from(bounds: &ServiceBounds) -> Self {
        Self {
            min: bounds.min.unwrap_or(DEFAULT_MIN_TEMPERATURE),
            max: bounds.max.unwrap_or(DEFAULT_MAX_TEMPERATURE),
            step: bounds.step.unwrap_or(DEFAULT_TEMPERATURE_STEP),
        }
    }
}

/// Remote temperature → host temperature. Numeric strings are accepted;
/// anything else reads as 0.
pub fn temperature_to_host(remote: &Value) -> f64 {
    match remote {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn temperature_to_remote(celsius: f64) -> Value {
    serde_json::Number::from_f64(celsius).map_or(Value::Null, Value::Number)
}
