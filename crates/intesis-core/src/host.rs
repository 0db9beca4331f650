// ── Host-side characteristic surface ──
//
// The smart-home host owns its characteristic objects; the bridge only
// receives handles to them through a `CapabilityRegistry` passed in at
// construction. No global factories.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::mapping::{Activity, HostMode, TemperatureBounds};

/// Host characteristic types the bridge knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
pub enum CharacteristicKind {
    Active,
    TargetHeaterCoolerState,
    RotationSpeed,
    HeatingThresholdTemperature,
    CoolingThresholdTemperature,
    CurrentTemperature,
    MotionDetected,
}

/// A value in the host's domain, typed per characteristic family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum HostValue {
    Active(Activity),
    Mode(HostMode),
    FanLevel(u8),
    Temperature(f64),
    Detected(bool),
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active(a) => f.write_str(if a.is_active() { "on" } else { "off" }),
            Self::Mode(HostMode::Auto) => f.write_str("auto"),
            Self::Mode(HostMode::Heat) => f.write_str("heat"),
            Self::Mode(HostMode::Cool) => f.write_str("cool"),
            Self::FanLevel(level) => write!(f, "{level}"),
            Self::Temperature(t) => write!(f, "{t:.1}"),
            Self::Detected(d) => write!(f, "{d}"),
        }
    }
}

/// Identity shown by the host for one accessory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessoryInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

impl AccessoryInfo {
    pub const MANUFACTURER: &'static str = "Intesis";

    /// Cloud HVAC unit; the device id doubles as its serial.
    pub fn hvac_unit(device_id: &str) -> Self {
        Self {
            manufacturer: Self::MANUFACTURER.to_owned(),
            model: "IntesisHome AC".to_owned(),
            serial_number: device_id.to_owned(),
        }
    }

    pub fn motion_sensor(name: &str) -> Self {
        Self {
            manufacturer: Self::MANUFACTURER.to_owned(),
            model: "Motion Sensor".to_owned(),
            serial_number: name.to_owned(),
        }
    }
}

/// Handle to one externally-owned characteristic.
pub trait CharacteristicHandle: Send + Sync {
    /// Push a new value to the host without a get round-trip.
    fn update_value(&self, value: HostValue);

    /// Apply min/max/step properties. Only temperature characteristics
    /// care; the default ignores them.
    fn set_temperature_bounds(&self, _bounds: TemperatureBounds) {}
}

/// Injected factory for characteristic handles.
///
/// `accessory` is the stable accessory identifier (device id for HVAC
/// units, the configured name for motion sensors). Returning `None` leaves
/// that characteristic unwired; get/set still work, but nothing is pushed.
pub trait CapabilityRegistry: Send + Sync {
    fn characteristic(
        &self,
        accessory: &str,
        kind: CharacteristicKind,
    ) -> Option<Arc<dyn CharacteristicHandle>>;

    /// Publish the accessory's identity. Called once, before any
    /// characteristic value is pushed.
    fn information(&self, _accessory: &str, _info: &AccessoryInfo) {}
}

/// Registry that wires nothing. Useful for headless reads and writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unwired;

impl CapabilityRegistry for Unwired {
    fn characteristic(
        &self,
        _accessory: &str,
        _kind: CharacteristicKind,
    ) -> Option<Arc<dyn CharacteristicHandle>> {
        None
    }
}
