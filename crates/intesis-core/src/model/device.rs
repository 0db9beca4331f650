// ── Device and snapshot domain types ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::service::{ServiceId, ServiceState};

/// One HVAC unit as reported by the cloud configuration.
///
/// Identity is `device_id`. Records are never mutated in place: bridges
/// swap in a whole new record on refresh or after a write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRecord {
    pub device_id: String,
    pub name: String,
    pub services: BTreeMap<ServiceId, ServiceState>,
}

impl DeviceRecord {
    pub fn service(&self, id: &ServiceId) -> Option<&ServiceState> {
        self.services.get(id)
    }

    pub fn has_service(&self, id: &ServiceId) -> bool {
        self.services.contains_key(id)
    }

    /// Copy of this record with one service value replaced.
    ///
    /// Bounds are kept; a service that did not exist is added without
    /// bounds.
    pub fn with_service_value(&self, id: &ServiceId, value: serde_json::Value) -> Self {
        let mut next = self.clone();
        next.services
            .entry(id.clone())
            .and_modify(|state| state.value = value.clone())
            .or_insert_with(|| ServiceState::new(value));
        next
    }
}

/// Whole-replace view of the remote configuration at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    pub devices: Vec<DeviceRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl ConfigSnapshot {
    pub fn device(&self, device_id: &str) -> Option<&DeviceRecord> {
        self.devices.iter().find(|d| d.device_id == device_id)
    }
}
