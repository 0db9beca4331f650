// ── API-to-domain type conversions ──
//
// Bridges raw `intesis_api` response types into canonical
// `intesis_core::model` domain types: string service keys become
// `ServiceId`, flat min/max/step become `ServiceBounds`, and a missing
// name becomes the empty string (filtered out at instantiation).

use chrono::{DateTime, Utc};

use intesis_api::{RawConfig, RawDevice, RawService};

use crate::model::{ConfigSnapshot, DeviceRecord, ServiceBounds, ServiceId, ServiceState};

impl From<RawService> for ServiceState {
    fn from(raw: RawService) -> Self {
        Self {
            value: raw.value,
            bounds: ServiceBounds {
                min: raw.min,
                max: raw.max,
                step: raw.step,
            },
        }
    }
}

impl From<RawDevice> for DeviceRecord {
    fn from(raw: RawDevice) -> Self {
        Self {
            device_id: raw.device_id,
            name: raw.name.map(|n| n.trim().to_owned()).unwrap_or_default(),
            services: raw
                .services
                .into_iter()
                .map(|(id, state)| (ServiceId::from(id.as_str()), ServiceState::from(state)))
                .collect(),
        }
    }
}

/// Build a snapshot stamped with the fetch time.
pub(crate) fn snapshot_from_raw(raw: RawConfig, fetched_at: DateTime<Utc>) -> ConfigSnapshot {
    ConfigSnapshot {
        devices: raw.devices.into_iter().map(DeviceRecord::from).collect(),
        fetched_at,
    }
}
