// ── Platform startup ──
//
// Sequences startup: token, refresh schedule, forced config fetch, one
// bridge per named device. Any failure before the bridges exist is
// terminal and nothing is instantiated.

use std::sync::Arc;

use tracing::{error, info, warn};

use intesis_api::{IntesisClient, TransportConfig};

use crate::api::CloudApi;
use crate::bridge::DeviceBridge;
use crate::cache::ConfigCache;
use crate::config::BridgeConfig;
use crate::credentials::CredentialManager;
use crate::error::CoreError;
use crate::host::CapabilityRegistry;

/// A running bridge: shared credentials, shared cache, one bridge per unit.
pub struct Platform<A: CloudApi> {
    credentials: Arc<CredentialManager<A>>,
    cache: Arc<ConfigCache<A>>,
    bridges: Vec<Arc<DeviceBridge<A>>>,
}

impl Platform<IntesisClient> {
    /// Build the HTTP client from `config` and start against the real cloud.
    pub async fn connect(
        config: &BridgeConfig,
        registry: &dyn CapabilityRegistry,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = IntesisClient::new(&config.api_base_url, &transport)?;
        info!(base_url = %client.base_url(), "connecting to Intesis cloud");
        Self::start(Arc::new(client), config, registry).await
    }
}

impl<A: CloudApi> Platform<A> {
    pub async fn start(
        api: Arc<A>,
        config: &BridgeConfig,
        registry: &dyn CapabilityRegistry,
    ) -> Result<Self, CoreError> {
        let credentials = CredentialManager::new(
            Arc::clone(&api),
            config.client_id.clone(),
            config.client_secret.clone(),
        );

        let token = credentials
            .acquire(&config.initial_grant())
            .await
            .inspect_err(|e| error!(error = %e, "startup failed, no devices added"))?;
        credentials.schedule_refresh(&token);

        let cache = ConfigCache::new(api, Arc::clone(&credentials), config.config_cache);
        let snapshot = match cache.refresh(true).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "startup failed, no devices added");
                credentials.shutdown();
                return Err(e);
            }
        };

        let mut bridges = Vec::with_capacity(snapshot.devices.len());
        for record in &snapshot.devices {
            if record.name.is_empty() {
                warn!(device_id = %record.device_id, "device has no name, not added");
                continue;
            }
            let bridge = DeviceBridge::new(record.clone(), Arc::clone(&cache), registry);
            cache.register(&bridge);
            info!(device_id = %record.device_id, name = %record.name, "added device");
            bridges.push(bridge);
        }

        Ok(Self {
            credentials,
            cache,
            bridges,
        })
    }

    pub fn bridges(&self) -> &[Arc<DeviceBridge<A>>] {
        &self.bridges
    }

    /// Look a bridge up by device id, or by name ignoring case.
    pub fn bridge(&self, id_or_name: &str) -> Result<&Arc<DeviceBridge<A>>, CoreError> {
        self.bridges
            .iter()
            .find(|b| b.device_id() == id_or_name)
            .or_else(|| {
                self.bridges
                    .iter()
                    .find(|b| b.name().eq_ignore_ascii_case(id_or_name))
            })
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: id_or_name.to_owned(),
            })
    }

    pub fn cache(&self) -> &Arc<ConfigCache<A>> {
        &self.cache
    }

    pub fn credentials(&self) -> &Arc<CredentialManager<A>> {
        &self.credentials
    }

    /// Stop the token refresh schedule. Bridges keep serving cached data.
    pub fn shutdown(&self) {
        info!("shutting down");
        self.credentials.shutdown();
    }
}
