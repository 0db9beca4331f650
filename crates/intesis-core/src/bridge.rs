// ── Device bridge ──
//
// Adapts one HVAC unit to the host's characteristic model. Reads go through
// the shared config cache; writes go straight to `POST api/v2/set` and patch
// the live record with whatever value the cloud accepted.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, info, warn};

use intesis_api::ServiceChange;

use crate::api::CloudApi;
use crate::cache::ConfigCache;
use crate::error::CoreError;
use crate::host::{
    AccessoryInfo, CapabilityRegistry, CharacteristicHandle, CharacteristicKind, HostValue,
};
use crate::mapping::{
    Activity, HostMode, TemperatureBounds, fan_speed_to_host, fan_speed_to_remote,
    mode_to_host, mode_to_remote, power_to_host, power_to_remote, temperature_to_host,
    temperature_to_remote,
};
use crate::model::{DeviceRecord, ServiceId};

// ── Capabilities ─────────────────────────────────────────────────────

/// Host-facing capabilities of an HVAC unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Power,
    Mode,
    FanSpeed,
    HeatingThreshold,
    CoolingThreshold,
    CurrentTemperature,
}

impl Capability {
    /// Remote service backing this capability. Both thresholds share the
    /// single setpoint.
    pub fn service(self) -> ServiceId {
        match self {
            Self::Power => ServiceId::Power,
            Self::Mode => ServiceId::UserMode,
            Self::FanSpeed => ServiceId::FanSpeed,
            Self::HeatingThreshold | Self::CoolingThreshold => ServiceId::Setpoint,
            Self::CurrentTemperature => ServiceId::CurrentTemperature,
        }
    }

    pub fn kind(self) -> CharacteristicKind {
        match self {
            Self::Power => CharacteristicKind::Active,
            Self::Mode => CharacteristicKind::TargetHeaterCoolerState,
            Self::FanSpeed => CharacteristicKind::RotationSpeed,
            Self::HeatingThreshold => CharacteristicKind::HeatingThresholdTemperature,
            Self::CoolingThreshold => CharacteristicKind::CoolingThresholdTemperature,
            Self::CurrentTemperature => CharacteristicKind::CurrentTemperature,
        }
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, Self::CurrentTemperature)
    }

    fn is_threshold(self) -> bool {
        matches!(self, Self::HeatingThreshold | Self::CoolingThreshold)
    }

    /// Map a remote service value into this capability's host domain.
    pub fn to_host(self, remote: &Value) -> HostValue {
        match self {
            Self::Power => HostValue::Active(power_to_host(remote)),
            Self::Mode => HostValue::Mode(mode_to_host(remote)),
            Self::FanSpeed => HostValue::FanLevel(fan_speed_to_host(remote)),
            Self::HeatingThreshold | Self::CoolingThreshold | Self::CurrentTemperature => {
                HostValue::Temperature(temperature_to_host(remote))
            }
        }
    }

    /// Map a host value into the remote encoding.
    ///
    /// Fails when the value belongs to another capability family.
    pub fn to_remote(self, value: HostValue) -> Result<Value, CoreError> {
        match (self, value) {
            (Self::Power, HostValue::Active(activity)) => Ok(power_to_remote(activity)),
            (Self::Mode, HostValue::Mode(mode)) => Ok(Value::from(mode_to_remote(mode))),
            (Self::FanSpeed, HostValue::FanLevel(level)) => {
                Ok(Value::from(fan_speed_to_remote(level)))
            }
            (Self::HeatingThreshold | Self::CoolingThreshold, HostValue::Temperature(t)) => {
                Ok(temperature_to_remote(t))
            }
            (capability, value) => Err(CoreError::Application {
                message: format!("value '{value}' does not apply to {capability}"),
            }),
        }
    }

    /// Parse user input (`on`, `cool`, `3`, `22.5`, ...) for this capability.
    pub fn parse_value(self, input: &str) -> Result<HostValue, CoreError> {
        let input = input.trim();
        let invalid = || CoreError::Application {
            message: format!("invalid value '{input}' for {self}"),
        };

        match self {
            Self::Power => match input.to_ascii_lowercase().as_str() {
                "on" | "true" | "1" | "active" => Ok(HostValue::Active(Activity::Active)),
                "off" | "false" | "0" | "inactive" => Ok(HostValue::Active(Activity::Inactive)),
                _ => Err(invalid()),
            },
            Self::Mode => match input.to_ascii_lowercase().as_str() {
                "auto" => Ok(HostValue::Mode(HostMode::Auto)),
                "heat" => Ok(HostValue::Mode(HostMode::Heat)),
                "cool" => Ok(HostValue::Mode(HostMode::Cool)),
                other => other
                    .parse::<u8>()
                    .ok()
                    .filter(|raw| *raw <= 2)
                    .map(|raw| HostValue::Mode(HostMode::from_u8(raw)))
                    .ok_or_else(invalid),
            },
            Self::FanSpeed => input
                .parse::<u8>()
                .map(HostValue::FanLevel)
                .map_err(|_| invalid()),
            Self::HeatingThreshold | Self::CoolingThreshold => input
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite())
                .map(HostValue::Temperature)
                .ok_or_else(invalid),
            Self::CurrentTemperature => Err(CoreError::ReadOnly {
                capability: self.to_string(),
            }),
        }
    }
}

// ── Bridge ───────────────────────────────────────────────────────────

struct Wired {
    capability: Capability,
    handle: Arc<dyn CharacteristicHandle>,
}

/// One HVAC unit exposed to the host.
pub struct DeviceBridge<A: CloudApi> {
    device_id: String,
    name: String,
    record: ArcSwap<DeviceRecord>,
    capabilities: Vec<Capability>,
    wired: Vec<Wired>,
    cache: Arc<ConfigCache<A>>,
}

impl<A: CloudApi> DeviceBridge<A> {
    /// Build the dispatch table from the services present on `record` and
    /// ask `registry` for a handle per capability.
    pub fn new(
        record: DeviceRecord,
        cache: Arc<ConfigCache<A>>,
        registry: &dyn CapabilityRegistry,
    ) -> Arc<Self> {
        registry.information(&record.device_id, &AccessoryInfo::hvac_unit(&record.device_id));

        let capabilities: Vec<Capability> = Capability::iter()
            .filter(|c| record.has_service(&c.service()))
            .collect();

        let wired = capabilities
            .iter()
            .filter_map(|&capability| {
                registry
                    .characteristic(&record.device_id, capability.kind())
                    .map(|handle| Wired { capability, handle })
            })
            .collect();

        debug!(
            device_id = %record.device_id,
            capabilities = capabilities.len(),
            "bridge created"
        );

        let bridge = Arc::new(Self {
            device_id: record.device_id.clone(),
            name: record.name.clone(),
            record: ArcSwap::from_pointee(record),
            capabilities,
            wired,
            cache,
        });
        bridge.push(|_| true);
        bridge
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capabilities backed by a service on this device.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// The live record.
    pub fn record(&self) -> Arc<DeviceRecord> {
        self.record.load_full()
    }

    /// Setpoint range with defaults filled in.
    pub fn bounds(&self) -> TemperatureBounds {
        self.record
            .load()
            .service(&ServiceId::Setpoint)
            .map(|s| TemperatureBounds::from(&s.bounds))
            .unwrap_or_default()
    }

    /// Read `capability` from the live record without touching the cache.
    pub fn read(&self, capability: Capability) -> Option<HostValue> {
        self.record
            .load()
            .service(&capability.service())
            .map(|state| capability.to_host(&state.value))
    }

    // ── Host operations ──────────────────────────────────────────────

    /// Current value of `capability`, refreshing the shared config first
    /// when it is stale. `Ok(None)` when the device lacks the service.
    pub async fn get(&self, capability: Capability) -> Result<Option<HostValue>, CoreError> {
        self.cache.refresh(false).await?;
        let value = self.read(capability);
        debug!(device_id = %self.device_id, %capability, value = ?value, "get");
        Ok(value)
    }

    /// Write `value` and return what the cloud accepted, in host terms.
    ///
    /// On success the live record holds the accepted value immediately,
    /// before any later config refresh. On failure nothing changes.
    pub async fn set(&self, capability: Capability, value: HostValue) -> Result<HostValue, CoreError> {
        if !capability.is_writable() {
            return Err(CoreError::ReadOnly {
                capability: capability.to_string(),
            });
        }
        if !self.supports(capability) {
            return Err(CoreError::Application {
                message: format!("device '{}' has no {capability} service", self.device_id),
            });
        }

        let service = capability.service();
        let remote = capability.to_remote(value)?;
        let token = self.cache.credentials().access_token()?;
        let change = ServiceChange::new(self.device_id.clone(), service.as_str(), remote);

        let accepted = self
            .cache
            .api()
            .set_value(&token, &change)
            .await
            .map_err(|e| {
                let err = CoreError::from(e);
                warn!(device_id = %self.device_id, %capability, error = %err, "set failed");
                err
            })?;

        info!(
            device_id = %self.device_id,
            %capability,
            requested = %change.value,
            accepted = %accepted,
            "value set"
        );

        self.record
            .rcu(|current| current.with_service_value(&service, accepted.clone()));
        self.push(|c| c.service() == service);

        Ok(capability.to_host(&accepted))
    }

    /// Swap in a fresh record and push its values to the host. `None` is
    /// ignored.
    pub fn update_data(&self, record: Option<DeviceRecord>) {
        let Some(record) = record else {
            return;
        };
        self.record.store(Arc::new(record));
        self.push(|_| true);
    }

    fn push(&self, filter: impl Fn(Capability) -> bool) {
        let record = self.record.load();
        let bounds = record
            .service(&ServiceId::Setpoint)
            .map(|s| TemperatureBounds::from(&s.bounds))
            .unwrap_or_default();

        for wired in self.wired.iter().filter(|w| filter(w.capability)) {
            let Some(state) = record.service(&wired.capability.service()) else {
                continue;
            };
            if wired.capability.is_threshold() {
                wired.handle.set_temperature_bounds(bounds);
            }
            wired.handle.update_value(wired.capability.to_host(&state.value));
        }
    }
}

impl<A: CloudApi> std::fmt::Debug for DeviceBridge<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBridge")
            .field("device_id", &self.device_id)
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::credentials::CredentialManager;
    use crate::testing::{FakeCloud, RecordingRegistry, living_room_config};
    use intesis_api::{GrantType, TokenRequest};
    use secrecy::SecretString;
    use serde_json::json;
    use std::time::Duration;

    async fn bridge_with(
        api: &Arc<FakeCloud>,
        registry: &dyn CapabilityRegistry,
    ) -> Arc<DeviceBridge<FakeCloud>> {
        api.push_token("access", Some("refresh"), Some(3600));
        api.set_default_config(living_room_config());
        let credentials = CredentialManager::new(Arc::clone(api), None, None);
        credentials
            .acquire(&TokenRequest::password(
                GrantType::Password,
                None,
                None,
                "user".into(),
                SecretString::from("pw".to_owned()),
            ))
            .await
            .unwrap();
        let cache = ConfigCache::new(Arc::clone(api), credentials, Duration::from_secs(30));
        let snapshot = cache.refresh(true).await.unwrap();
        let bridge = DeviceBridge::new(snapshot.devices[0].clone(), Arc::clone(&cache), registry);
        cache.register(&bridge);
        bridge
    }

    #[test]
    fn capability_names_parse_case_insensitively() {
        assert_eq!("fan-speed".parse::<Capability>().unwrap(), Capability::FanSpeed);
        assert_eq!("Heating-Threshold".parse::<Capability>().unwrap(), Capability::HeatingThreshold);
        assert_eq!(Capability::CurrentTemperature.to_string(), "current-temperature");
        assert!("vane".parse::<Capability>().is_err());
    }

    #[test]
    fn parse_value_accepts_host_vocabulary() {
        assert_eq!(
            Capability::Power.parse_value("OFF").unwrap(),
            HostValue::Active(Activity::Inactive)
        );
        assert_eq!(Capability::Mode.parse_value("2").unwrap(), HostValue::Mode(HostMode::Cool));
        assert_eq!(Capability::FanSpeed.parse_value("3").unwrap(), HostValue::FanLevel(3));
        assert!(Capability::Mode.parse_value("dry").is_err());
        assert!(Capability::HeatingThreshold.parse_value("warm").is_err());
        assert!(matches!(
            Capability::CurrentTemperature.parse_value("20"),
            Err(CoreError::ReadOnly { .. })
        ));
    }

    #[test]
    fn mismatched_value_family_is_rejected() {
        let err = Capability::Power.to_remote(HostValue::FanLevel(2)).unwrap_err();
        assert!(matches!(err, CoreError::Application { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn get_maps_live_values() {
        let api = Arc::new(FakeCloud::new());
        let bridge = bridge_with(&api, &crate::host::Unwired).await;

        assert_eq!(
            bridge.get(Capability::Mode).await.unwrap(),
            Some(HostValue::Mode(HostMode::Cool))
        );
        assert_eq!(
            bridge.get(Capability::FanSpeed).await.unwrap(),
            Some(HostValue::FanLevel(2))
        );
        assert_eq!(
            bridge.get(Capability::CurrentTemperature).await.unwrap(),
            Some(HostValue::Temperature(24.5))
        );
        assert_eq!(api.config_fetches(), 1, "fresh cache serves every get");
    }

    #[tokio::test(start_paused = true)]
    async fn get_without_service_is_none() {
        let api = Arc::new(FakeCloud::new());
        api.push_token("access", None, None);
        api.set_default_config(
            serde_json::from_value(json!({
                "devices": [{ "device_id": "dev-9", "name": "Attic", "services": {
                    "power": { "value": false }
                }}]
            }))
            .unwrap(),
        );
        let credentials = CredentialManager::new(Arc::clone(&api), None, None);
        credentials
            .acquire(&TokenRequest::password(
                GrantType::Password,
                None,
                None,
                "user".into(),
                SecretString::from("pw".to_owned()),
            ))
            .await
            .unwrap();
        let cache = ConfigCache::new(Arc::clone(&api), credentials, Duration::from_secs(30));
        let snapshot = cache.refresh(true).await.unwrap();
        let bridge = DeviceBridge::new(snapshot.devices[0].clone(), cache, &crate::host::Unwired);

        assert_eq!(bridge.capabilities(), &[Capability::Power]);
        assert_eq!(bridge.get(Capability::FanSpeed).await.unwrap(), None);
        assert_eq!(bridge.bounds(), TemperatureBounds::default());
    }

    #[tokio::test(start_paused = true)]
    async fn power_set_is_idempotent() {
        let api = Arc::new(FakeCloud::new());
        let bridge = bridge_with(&api, &crate::host::Unwired).await;

        for _ in 0..2 {
            let accepted = bridge
                .set(Capability::Power, HostValue::Active(Activity::Inactive))
                .await
                .unwrap();
            assert_eq!(accepted, HostValue::Active(Activity::Inactive));
            assert_eq!(
                bridge.record().service(&ServiceId::Power).unwrap().value,
                json!(false)
            );
        }

        let changes = api.changes();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.service_id == "power" && c.value == json!(false)));
    }

    #[tokio::test(start_paused = true)]
    async fn fan_set_never_sends_empty_speed() {
        let api = Arc::new(FakeCloud::new());
        let bridge = bridge_with(&api, &crate::host::Unwired).await;

        bridge
            .set(Capability::FanSpeed, HostValue::FanLevel(0))
            .await
            .unwrap();

        let change = api.changes().pop().unwrap();
        assert_eq!(change.service_id, "fan_speed");
        assert_eq!(change.value, json!("position-one"));
    }

    #[tokio::test(start_paused = true)]
    async fn cache_holds_accepted_value_not_requested() {
        let api = Arc::new(FakeCloud::new());
        let bridge = bridge_with(&api, &crate::host::Unwired).await;
        api.push_set(Ok(json!(30)));

        let accepted = bridge
            .set(Capability::CoolingThreshold, HostValue::Temperature(35.0))
            .await
            .unwrap();

        assert_eq!(accepted, HostValue::Temperature(30.0));
        assert_eq!(
            bridge.read(Capability::HeatingThreshold),
            Some(HostValue::Temperature(30.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn setpoint_write_pushes_value_and_bounds() {
        let api = Arc::new(FakeCloud::new());
        let registry = RecordingRegistry::default();
        let bridge = bridge_with(&api, &registry).await;
        let heating = registry.handle("dev-1", CharacteristicKind::HeatingThresholdTemperature);
        let cooling = registry.handle("dev-1", CharacteristicKind::CoolingThresholdTemperature);

        bridge
            .set(Capability::HeatingThreshold, HostValue::Temperature(22.0))
            .await
            .unwrap();

        let expected_bounds = TemperatureBounds {
            min: 18.0,
            max: 30.0,
            step: 0.5,
        };
        for handle in [&heating, &cooling] {
            assert_eq!(
                handle.values.lock().unwrap().last(),
                Some(&HostValue::Temperature(22.0))
            );
            assert_eq!(handle.bounds.lock().unwrap().last(), Some(&expected_bounds));
        }
        let power = registry.handle("dev-1", CharacteristicKind::Active);
        assert_eq!(power.values.lock().unwrap().len(), 1, "only construction pushed power");
    }

    #[tokio::test(start_paused = true)]
    async fn construction_publishes_accessory_information() {
        let api = Arc::new(FakeCloud::new());
        let registry = RecordingRegistry::default();
        let _bridge = bridge_with(&api, &registry).await;

        let info = registry.information();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].0, "dev-1");
        assert_eq!(info[0].1.manufacturer, "Intesis");
        assert_eq!(info[0].1.serial_number, "dev-1");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_set_leaves_record_untouched() {
        let api = Arc::new(FakeCloud::new());
        let bridge = bridge_with(&api, &crate::host::Unwired).await;
        let before = bridge.record();
        api.push_set(Err(intesis_api::Error::Api {
            status: 500,
            message: "boom".into(),
        }));

        let err = bridge
            .set(Capability::Mode, HostValue::Mode(HostMode::Heat))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Api { status: 500, .. }));
        assert_eq!(*bridge.record(), *before);
    }

    #[tokio::test(start_paused = true)]
    async fn read_only_capability_rejects_writes() {
        let api = Arc::new(FakeCloud::new());
        let bridge = bridge_with(&api, &crate::host::Unwired).await;

        let err = bridge
            .set(Capability::CurrentTemperature, HostValue::Temperature(20.0))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ReadOnly { .. }));
        assert!(api.changes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn update_data_none_is_noop() {
        let api = Arc::new(FakeCloud::new());
        let bridge = bridge_with(&api, &crate::host::Unwired).await;
        let before = bridge.record();

        bridge.update_data(None);

        assert!(Arc::ptr_eq(&bridge.record(), &before));
    }
}
