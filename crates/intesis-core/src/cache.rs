// ── Coalesced TTL config cache ──
//
// One shared view of `GET api/v1/config`. Fresh snapshots are served
// without a fetch; concurrent stale callers join the single in-flight fetch
// instead of issuing their own. The fetch runs in its own task, so a caller
// that gives up cannot leave the in-flight flag stuck.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::api::CloudApi;
use crate::bridge::DeviceBridge;
use crate::convert::snapshot_from_raw;
use crate::credentials::CredentialManager;
use crate::error::CoreError;
use crate::model::ConfigSnapshot;

type Waiter = oneshot::Sender<Result<Arc<ConfigSnapshot>, CoreError>>;

#[derive(Default)]
struct CacheState {
    snapshot: Option<Arc<ConfigSnapshot>>,
    fetched_at: Option<Instant>,
    in_flight: bool,
    waiters: Vec<Waiter>,
}

/// Shared config cache. Bridges register here to receive fresh records.
pub struct ConfigCache<A: CloudApi> {
    api: Arc<A>,
    credentials: Arc<CredentialManager<A>>,
    ttl: Duration,
    state: Mutex<CacheState>,
    bridges: DashMap<String, Weak<DeviceBridge<A>>>,
}

impl<A: CloudApi> ConfigCache<A> {
    pub fn new(api: Arc<A>, credentials: Arc<CredentialManager<A>>, ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            api,
            credentials,
            ttl,
            state: Mutex::new(CacheState::default()),
            bridges: DashMap::new(),
        })
    }

    /// Return the config snapshot, fetching it when stale or when `force`
    /// is set.
    ///
    /// While a fetch is in flight every caller, forced or not, waits for
    /// that fetch. All of them receive the same `Arc`, or a clone of the
    /// same error.
    pub async fn refresh(self: &Arc<Self>, force: bool) -> Result<Arc<ConfigSnapshot>, CoreError> {
        let rx = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

            if !force && !state.in_flight {
                if let (Some(snapshot), Some(fetched_at)) = (&state.snapshot, state.fetched_at) {
                    if fetched_at.elapsed() <= self.ttl {
                        debug!("serving cached config");
                        return Ok(Arc::clone(snapshot));
                    }
                }
            }

            let (tx, rx) = oneshot::channel();
            state.waiters.push(tx);
            if state.in_flight {
                debug!(waiters = state.waiters.len(), "joining in-flight config fetch");
            } else {
                state.in_flight = true;
                tokio::spawn(Arc::clone(self).run_fetch());
            }
            rx
        };

        rx.await
            .map_err(|_| CoreError::Internal("config fetch ended without settling".into()))?
    }

    async fn run_fetch(self: Arc<Self>) {
        let result = self.fetch().await;

        match &result {
            Ok(snapshot) => {
                info!(devices = snapshot.devices.len(), "config refreshed");
                self.distribute(snapshot);
            }
            Err(e) => warn!(error = %e, "config refresh failed, keeping previous snapshot"),
        }

        let waiters = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Ok(snapshot) = &result {
                state.snapshot = Some(Arc::clone(snapshot));
                state.fetched_at = Some(Instant::now());
            }
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };

        // Drained from the end: the latest caller is settled first.
        for waiter in waiters.into_iter().rev() {
            let _ = waiter.send(result.clone());
        }
    }

    async fn fetch(&self) -> Result<Arc<ConfigSnapshot>, CoreError> {
        let token = self.credentials.access_token()?;
        debug!("fetching config");

        let raw = self.api.fetch_config(&token).await?;
        if raw.devices.is_empty() {
            return Err(CoreError::MalformedResponse {
                message: "config contains no devices".into(),
            });
        }

        Ok(Arc::new(snapshot_from_raw(raw, Utc::now())))
    }

    /// Hand each registered bridge its record from `snapshot`.
    fn distribute(&self, snapshot: &ConfigSnapshot) {
        self.bridges.retain(|device_id, bridge| {
            let Some(bridge) = bridge.upgrade() else {
                debug!(device_id = %device_id, "dropping released bridge");
                return false;
            };
            match snapshot.device(device_id) {
                Some(record) => bridge.update_data(Some(record.clone())),
                None => debug!(device_id = %device_id, "device missing from config, keeping last record"),
            }
            true
        });
    }

    // ── Registration & accessors ─────────────────────────────────────

    /// Register a bridge to receive records on every successful fetch.
    ///
    /// Only a weak reference is kept; a dropped bridge is forgotten on the
    /// next fetch.
    pub fn register(&self, bridge: &Arc<DeviceBridge<A>>) {
        self.bridges
            .insert(bridge.device_id().to_owned(), Arc::downgrade(bridge));
    }

    /// Last successfully fetched snapshot, without fetching.
    pub fn snapshot(&self) -> Option<Arc<ConfigSnapshot>> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn credentials(&self) -> &Arc<CredentialManager<A>> {
        &self.credentials
    }
}
