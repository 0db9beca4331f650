// ── Service identity and state ──

use std::fmt;

use serde::{Serialize, Serializer};

/// Closed set of service identifiers the bridge understands.
///
/// Anything else the cloud reports is kept as [`ServiceId::Unknown`] so it
/// still round-trips through snapshots but never binds to a capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceId {
    Power,
    UserMode,
    FanSpeed,
    Setpoint,
    CurrentTemperature,
    Unknown(String),
}

impl ServiceId {
    /// The identifier used on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Power => "power",
            Self::UserMode => "user_mode",
            Self::FanSpeed => "fan_speed",
            Self::Setpoint => "setpoint_temp",
            Self::CurrentTemperature => "current_temp",
            Self::Unknown(id) => id,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        match id {
            "power" => Self::Power,
            "user_mode" => Self::UserMode,
            "fan_speed" => Self::FanSpeed,
            "setpoint_temp" => Self::Setpoint,
            "current_temp" => Self::CurrentTemperature,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ServiceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Optional numeric range reported alongside a service value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ServiceBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
}

/// Current value of one controllable or observable capability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceState {
    pub value: serde_json::Value,
    pub bounds: ServiceBounds,
}

impl ServiceState {
    pub fn new(value: serde_json::Value) -> Self {
        Self {
            value,
            bounds: ServiceBounds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_round_trip() {
        for id in [
            ServiceId::Power,
            ServiceId::UserMode,
            ServiceId::FanSpeed,
            ServiceId::Setpoint,
            ServiceId::CurrentTemperature,
        ] {
            assert_eq!(ServiceId::from(id.as_str()), id);
            assert!(id.is_known());
        }
    }

    #[test]
    fn unrecognized_id_is_preserved() {
        let id = ServiceId::from("vane_position");
        assert_eq!(id, ServiceId::Unknown("vane_position".into()));
        assert_eq!(id.to_string(), "vane_position");
        assert!(!id.is_known());
    }
}
