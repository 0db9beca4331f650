// In-process stand-in for the cloud, driven by queued responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use intesis_api::{RawConfig, ServiceChange, TokenRequest, TokenResponse};

use crate::api::CloudApi;

#[derive(Default)]
struct State {
    tokens: VecDeque<Result<TokenResponse, intesis_api::Error>>,
    token_requests: Vec<TokenRequest>,
    configs: VecDeque<Result<RawConfig, intesis_api::Error>>,
    default_config: Option<RawConfig>,
    config_fetches: usize,
    sets: VecDeque<Result<Value, intesis_api::Error>>,
    changes: Vec<ServiceChange>,
}

#[derive(Default)]
pub(crate) struct FakeCloud {
    state: Mutex<State>,
    config_gate: Mutex<Option<Arc<Semaphore>>>,
    config_latency: Mutex<Option<Duration>>,
}

#[allow(clippy::unwrap_used)]
impl FakeCloud {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // ── Tokens ──

    pub(crate) fn push_token(&self, access: &str, refresh: Option<&str>, expires_in: Option<u64>) {
        self.state.lock().unwrap().tokens.push_back(Ok(TokenResponse {
            access_token: SecretString::from(access.to_owned()),
            refresh_token: refresh.map(|r| SecretString::from(r.to_owned())),
            expires_in: expires_in.map(Duration::from_secs),
        }));
    }

    pub(crate) fn push_token_error(&self, err: intesis_api::Error) {
        self.state.lock().unwrap().tokens.push_back(Err(err));
    }

    pub(crate) fn token_requests(&self) -> usize {
        self.state.lock().unwrap().token_requests.len()
    }

    pub(crate) fn last_token_request(&self) -> Option<TokenRequest> {
        self.state.lock().unwrap().token_requests.last().cloned()
    }

    // ── Config ──

    /// Served whenever the config queue is empty.
    pub(crate) fn set_default_config(&self, config: RawConfig) {
        self.state.lock().unwrap().default_config = Some(config);
    }

    pub(crate) fn push_config(&self, config: Result<RawConfig, intesis_api::Error>) {
        self.state.lock().unwrap().configs.push_back(config);
    }

    pub(crate) fn config_fetches(&self) -> usize {
        self.state.lock().unwrap().config_fetches
    }

    /// Hold every config fetch until the returned semaphore gets permits.
    pub(crate) fn gate_config(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.config_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn set_config_latency(&self, latency: Duration) {
        *self.config_latency.lock().unwrap() = Some(latency);
    }

    // ── Writes ──

    pub(crate) fn push_set(&self, result: Result<Value, intesis_api::Error>) {
        self.state.lock().unwrap().sets.push_back(result);
    }

    pub(crate) fn changes(&self) -> Vec<ServiceChange> {
        self.state.lock().unwrap().changes.clone()
    }
}

#[allow(clippy::unwrap_used)]
impl CloudApi for FakeCloud {
    async fn request_token(
        &self,
        request: &TokenRequest,
    ) -> Result<TokenResponse, intesis_api::Error> {
        let mut state = self.state.lock().unwrap();
        state.token_requests.push(request.clone());
        state.tokens.pop_front().unwrap_or_else(|| {
            Err(intesis_api::Error::Unauthorized {
                status: 400,
                message: "no token queued".into(),
            })
        })
    }

    async fn fetch_config(&self, _access_token: &SecretString) -> Result<RawConfig, intesis_api::Error> {
        self.state.lock().unwrap().config_fetches += 1;

        let gate = self.config_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        let latency = *self.config_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state.lock().unwrap();
        match state.configs.pop_front() {
            Some(result) => result,
            None => state.default_config.clone().ok_or_else(|| {
                intesis_api::Error::Api {
                    status: 500,
                    message: "no config queued".into(),
                }
            }),
        }
    }

    async fn set_value(
        &self,
        _access_token: &SecretString,
        change: &ServiceChange,
    ) -> Result<Value, intesis_api::Error> {
        let mut state = self.state.lock().unwrap();
        state.changes.push(change.clone());
        state
            .sets
            .pop_front()
            .unwrap_or_else(|| Ok(change.value.clone()))
    }
}

/// A one-device config with every known service populated.
#[allow(clippy::unwrap_used)]
pub(crate) fn living_room_config() -> RawConfig {
    serde_json::from_value(json!({
        "devices": [{
            "device_id": "dev-1",
            "name": "Living Room",
            "services": {
                "power": { "value": true },
                "user_mode": { "value": "cool" },
                "fan_speed": { "value": "position-two" },
                "setpoint_temp": { "value": 23, "min": 18, "max": 30, "step": 0.5 },
                "current_temp": { "value": 24.5 }
            }
        }]
    }))
    .unwrap()
}

/// Same device, different readings.
#[allow(clippy::unwrap_used)]
pub(crate) fn living_room_config_updated() -> RawConfig {
    serde_json::from_value(json!({
        "devices": [{
            "device_id": "dev-1",
            "name": "Living Room",
            "services": {
                "power": { "value": false },
                "user_mode": { "value": "heat" },
                "fan_speed": { "value": "position-four" },
                "setpoint_temp": { "value": 21, "min": 16, "max": 28, "step": 1 },
                "current_temp": { "value": 19.0 }
            }
        }]
    }))
    .unwrap()
}

/// Records every value pushed to it.
#[derive(Default)]
pub(crate) struct RecordingHandle {
    pub(crate) values: Mutex<Vec<crate::host::HostValue>>,
    pub(crate) bounds: Mutex<Vec<crate::mapping::TemperatureBounds>>,
}

#[allow(clippy::unwrap_used)]
impl crate::host::CharacteristicHandle for RecordingHandle {
    fn update_value(&self, value: crate::host::HostValue) {
        self.values.lock().unwrap().push(value);
    }

    fn set_temperature_bounds(&self, bounds: crate::mapping::TemperatureBounds) {
        self.bounds.lock().unwrap().push(bounds);
    }
}

/// Hands out one shared [`RecordingHandle`] per characteristic kind.
#[derive(Default)]
pub(crate) struct RecordingRegistry {
    handles: Mutex<Vec<(String, crate::host::CharacteristicKind, Arc<RecordingHandle>)>>,
    info: Mutex<Vec<(String, crate::host::AccessoryInfo)>>,
}

#[allow(clippy::unwrap_used)]
impl RecordingRegistry {
    pub(crate) fn handle(
        &self,
        accessory: &str,
        kind: crate::host::CharacteristicKind,
    ) -> Arc<RecordingHandle> {
        let mut handles = self.handles.lock().unwrap();
        if let Some((_, _, h)) = handles.iter().find(|(a, k, _)| a == accessory && *k == kind) {
            return Arc::clone(h);
        }
        let handle = Arc::new(RecordingHandle::default());
        handles.push((accessory.to_owned(), kind, Arc::clone(&handle)));
        handle
    }

    /// Identities published so far, in call order.
    pub(crate) fn information(&self) -> Vec<(String, crate::host::AccessoryInfo)> {
        self.info.lock().unwrap().clone()
    }
}

impl crate::host::CapabilityRegistry for RecordingRegistry {
    fn characteristic(
        &self,
        accessory: &str,
        kind: crate::host::CharacteristicKind,
    ) -> Option<Arc<dyn crate::host::CharacteristicHandle>> {
        Some(self.handle(accessory, kind))
    }

    #[allow(clippy::unwrap_used)]
    fn information(&self, accessory: &str, info: &crate::host::AccessoryInfo) {
        self.info
            .lock()
            .unwrap()
            .push((accessory.to_owned(), info.clone()));
    }
}
