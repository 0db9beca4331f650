// ── OAuth2 credential lifecycle ──
//
// Acquires the initial token with the configured grant, then keeps it
// alive with a proactive one-shot refresh timer armed 30 seconds before
// expiry. Refresh failures are logged and not retried; the previous token
// stays in place until something else replaces it.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use intesis_api::{TokenRequest, TokenResponse};

use crate::api::CloudApi;
use crate::error::CoreError;

/// How long before expiry the refresh timer fires.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Delay for a refresh timer given the token lifetime: `expires_in − 30s`,
/// never negative.
pub fn refresh_delay(expires_in: Duration) -> Duration {
    expires_in.saturating_sub(REFRESH_MARGIN)
}

/// The currently held token. Memory-only.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    fn from_response(token: &TokenResponse) -> Self {
        Self {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            expires_at: token
                .expires_in
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .map(|d| Utc::now() + d),
        }
    }
}

struct RefreshTimer {
    generation: u64,
    delay: Duration,
    deadline: Instant,
    cancel: CancellationToken,
}

#[derive(Default)]
struct TimerSlot {
    generation: u64,
    current: Option<RefreshTimer>,
}

/// Owns the single credential and its refresh timer.
///
/// Always used behind an `Arc` so the timer task can call back into
/// [`refresh`](Self::refresh); the task only holds a weak reference, so
/// dropping the last `Arc` stops the schedule.
pub struct CredentialManager<A: CloudApi> {
    api: Arc<A>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    credential: ArcSwapOption<Credential>,
    timer: Mutex<TimerSlot>,
}

impl<A: CloudApi> CredentialManager<A> {
    pub fn new(
        api: Arc<A>,
        client_id: Option<String>,
        client_secret: Option<SecretString>,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            client_id,
            client_secret,
            credential: ArcSwapOption::empty(),
            timer: Mutex::new(TimerSlot::default()),
        })
    }

    // ── Grants ───────────────────────────────────────────────────────

    /// Perform the initial grant and store the resulting credential.
    ///
    /// Does not arm the refresh timer; call
    /// [`schedule_refresh`](Self::schedule_refresh) with the returned token.
    pub async fn acquire(&self, grant: &TokenRequest) -> Result<TokenResponse, CoreError> {
        info!(grant_type = grant.grant_type.as_str(), "obtaining token");

        let token = self.api.request_token(grant).await.map_err(|e| {
            let err = CoreError::from(e);
            warn!(error = %err, "failed to obtain token");
            err
        })?;

        self.credential
            .store(Some(Arc::new(Credential::from_response(&token))));
        info!("successfully obtained token");
        Ok(token)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// On success the credential is replaced and the timer re-armed. On
    /// failure the previous credential is kept and the error returned.
    /// When the response omits a refresh token, the previous one is reused.
    pub async fn refresh(self: &Arc<Self>) -> Result<TokenResponse, CoreError> {
        let refresh_token = self
            .credential
            .load()
            .as_ref()
            .and_then(|c| c.refresh_token.clone())
            .ok_or_else(|| CoreError::Authentication {
                message: "no refresh token available".into(),
            })?;

        debug!("refreshing token");
        let request = TokenRequest::refresh(
            self.client_id.clone(),
            self.client_secret.clone(),
            refresh_token.clone(),
        );

        match self.api.request_token(&request).await {
            Ok(mut token) => {
                if token.refresh_token.is_none() {
                    token.refresh_token = Some(refresh_token);
                }
                self.credential
                    .store(Some(Arc::new(Credential::from_response(&token))));
                info!("token refreshed");
                self.schedule_refresh(&token);
                Ok(token)
            }
            Err(e) => {
                let err = CoreError::from(e);
                warn!(error = %err, "token refresh failed, keeping previous token");
                Err(err)
            }
        }
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Arm the proactive refresh for `token`, replacing any armed timer.
    ///
    /// Needs both a refresh token and an expiry; otherwise logs that the
    /// session will lapse and leaves nothing armed.
    pub fn schedule_refresh(self: &Arc<Self>, token: &TokenResponse) {
        let (Some(_), Some(expires_in)) = (&token.refresh_token, token.expires_in) else {
            warn!("token has no refresh token or expiry, session will fail when it expires");
            self.cancel_timer();
            return;
        };

        let delay = refresh_delay(expires_in);
        let cancel = CancellationToken::new();

        let generation = {
            let mut slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
            slot.generation += 1;
            if let Some(previous) = slot.current.take() {
                previous.cancel.cancel();
            }
            slot.current = Some(RefreshTimer {
                generation: slot.generation,
                delay,
                deadline: Instant::now() + delay,
                cancel: cancel.clone(),
            });
            slot.generation
        };

        debug!(delay_secs = delay.as_secs(), "token refresh scheduled");
        tokio::spawn(refresh_timer_task(Arc::downgrade(self), generation, delay, cancel));
    }

    fn cancel_timer(&self) {
        let mut slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.current.take() {
            previous.cancel.cancel();
        }
    }

    /// Clear the slot if it still holds the timer that just fired.
    ///
    /// Returns `false` when a newer timer replaced it; that timer owns the
    /// refresh.
    fn timer_fired(&self, generation: u64) -> bool {
        let mut slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.current.as_ref().is_some_and(|t| t.generation == generation) {
            slot.current = None;
            true
        } else {
            false
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The current access token.
    pub fn access_token(&self) -> Result<SecretString, CoreError> {
        self.credential
            .load()
            .as_ref()
            .map(|c| c.access_token.clone())
            .ok_or_else(|| CoreError::Authentication {
                message: "no token has been obtained".into(),
            })
    }

    pub fn credential(&self) -> Option<Arc<Credential>> {
        self.credential.load_full()
    }

    /// Delay the armed refresh timer was scheduled with, if one is armed.
    pub fn scheduled_refresh(&self) -> Option<Duration> {
        let slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        slot.current.as_ref().map(|t| t.delay)
    }

    /// Time left until the armed refresh fires.
    pub fn refresh_due_in(&self) -> Option<Duration> {
        let slot = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        slot.current
            .as_ref()
            .map(|t| t.deadline.saturating_duration_since(Instant::now()))
    }

    /// Cancel the refresh schedule. The credential itself is kept.
    pub fn shutdown(&self) {
        self.cancel_timer();
    }
}

impl<A: CloudApi> Drop for CredentialManager<A> {
    fn drop(&mut self) {
        if let Ok(slot) = self.timer.get_mut() {
            if let Some(timer) = slot.current.take() {
                timer.cancel.cancel();
            }
        }
    }
}

async fn refresh_timer_task<A: CloudApi>(
    manager: Weak<CredentialManager<A>>,
    generation: u64,
    delay: Duration,
    cancel: CancellationToken,
) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {}
        () = tokio::time::sleep(delay) => {
            let Some(manager) = manager.upgrade() else { return };
            if !manager.timer_fired(generation) {
                debug!(generation, "superseded refresh timer fired, skipping");
                return;
            }
            // Errors are already logged; no retry until the next grant.
            let _ = manager.refresh().await;
        }
    }
}
