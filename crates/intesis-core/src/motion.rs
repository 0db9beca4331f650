// ── Motion debounce / fuse filter ──
//
// Turns a noisy raw detection signal into a stable presence signal. A drop
// in the raw signal is held for `stop_delay` before it is reported, and a
// start-after-stop fuse suppresses re-triggers for `start_after_stop_fuse`
// after each drop (lights switching off can read as motion).

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::host::{
    AccessoryInfo, CapabilityRegistry, CharacteristicHandle, CharacteristicKind, HostValue,
};

/// Filter timings. Both are required; there are no built-in defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotionTimings {
    /// How long presence stays asserted after the raw signal drops.
    pub stop_delay: Duration,
    /// How long re-triggers are suppressed after each drop.
    pub start_after_stop_fuse: Duration,
}

impl MotionTimings {
    pub fn new(stop_delay: Duration, start_after_stop_fuse: Duration) -> Self {
        Self {
            stop_delay,
            start_after_stop_fuse,
        }
    }
}

/// What a raw event did to the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Matched the reported state, or a stop was already pending.
    Unchanged,
    /// Motion resumed before the stop fired; presence continues.
    StopCancelled,
    /// Motion arrived inside the fuse window and was ignored.
    Suppressed,
    /// Presence reported.
    Started,
    /// Stop timer and fuse armed; presence still reported until the stop fires.
    StopQueued,
}

/// Observable filter phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MotionPhase {
    Idle,
    Active,
    StopPending,
}

struct Timer {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct MotionState {
    detected: bool,
    stop: Option<Timer>,
    fuse: Option<Timer>,
    generation: u64,
}

impl MotionState {
    fn next_timer(&mut self) -> Timer {
        self.generation += 1;
        Timer {
            generation: self.generation,
            cancel: CancellationToken::new(),
        }
    }
}

struct Inner {
    timings: MotionTimings,
    state: Mutex<MotionState>,
    output: watch::Sender<bool>,
    handle: Option<Arc<dyn CharacteristicHandle>>,
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, MotionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, detected: bool) {
        self.output.send_replace(detected);
        if let Some(handle) = &self.handle {
            handle.update_value(HostValue::Detected(detected));
        }
        info!(detected, "motion state updated");
    }
}

/// Debounce/fuse state machine.
///
/// Timers run as tokio tasks, so [`update`](Self::update) must be called
/// from within a runtime. Dropping the filter cancels both timers.
pub struct MotionFilter {
    inner: Arc<Inner>,
}

impl MotionFilter {
    pub fn new(timings: MotionTimings, handle: Option<Arc<dyn CharacteristicHandle>>) -> Self {
        let (output, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                timings,
                state: Mutex::new(MotionState::default()),
                output,
                handle,
            }),
        }
    }

    pub fn timings(&self) -> MotionTimings {
        self.inner.timings
    }

    /// The stable (filtered) signal.
    pub fn is_detected(&self) -> bool {
        self.inner.lock().detected
    }

    pub fn phase(&self) -> MotionPhase {
        let state = self.inner.lock();
        match (state.detected, state.stop.is_some()) {
            (_, true) => MotionPhase::StopPending,
            (true, false) => MotionPhase::Active,
            (false, false) => MotionPhase::Idle,
        }
    }

    pub fn is_fuse_armed(&self) -> bool {
        self.inner.lock().fuse.is_some()
    }

    /// Receiver that observes every committed change of the stable signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.output.subscribe()
    }

    /// Feed one raw detection event.
    pub fn update(&self, raw: bool) -> Transition {
        let mut state = self.inner.lock();

        if state.stop.is_some() {
            if !raw {
                debug!("stop already queued");
                return Transition::Unchanged;
            }
            // An armed fuse wins over cancelling: the stop stays queued.
            if state.fuse.is_some() {
                debug!("motion start inside fuse window, ignored");
                return Transition::Suppressed;
            }
            if let Some(stop) = state.stop.take() {
                stop.cancel.cancel();
            }
            debug!("motion resumed while stop was queued, stop cancelled");
            return Transition::StopCancelled;
        }

        if raw == state.detected {
            debug!(raw, "motion state unchanged");
            return Transition::Unchanged;
        }

        if raw {
            if state.fuse.is_some() {
                debug!("motion start inside fuse window, ignored");
                return Transition::Suppressed;
            }
            state.detected = true;
            drop(state);
            self.inner.emit(true);
            return Transition::Started;
        }

        let stop = state.next_timer();
        let fuse = state.next_timer();
        spawn_timer(
            Arc::downgrade(&self.inner),
            stop.generation,
            stop.cancel.clone(),
            self.inner.timings.stop_delay,
            fire_stop,
        );
        spawn_timer(
            Arc::downgrade(&self.inner),
            fuse.generation,
            fuse.cancel.clone(),
            self.inner.timings.start_after_stop_fuse,
            clear_fuse,
        );
        if let Some(previous) = state.fuse.replace(fuse) {
            previous.cancel.cancel();
        }
        state.stop = Some(stop);
        debug!(
            stop_delay = ?self.inner.timings.stop_delay,
            fuse = ?self.inner.timings.start_after_stop_fuse,
            "motion ended, stop queued and fuse armed"
        );
        Transition::StopQueued
    }
}

impl Drop for MotionFilter {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        for timer in [state.stop.take(), state.fuse.take()].into_iter().flatten() {
            timer.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for MotionFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionFilter")
            .field("timings", &self.inner.timings)
            .field("detected", &self.is_detected())
            .finish_non_exhaustive()
    }
}

fn spawn_timer(
    inner: Weak<Inner>,
    generation: u64,
    cancel: CancellationToken,
    delay: Duration,
    fire: fn(&Inner, u64),
) {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {}
            () = tokio::time::sleep(delay) => {
                if let Some(inner) = inner.upgrade() {
                    fire(&inner, generation);
                }
            }
        }
    });
}

fn fire_stop(inner: &Inner, generation: u64) {
    let mut state = inner.lock();
    if state.stop.as_ref().is_none_or(|t| t.generation != generation) {
        return;
    }
    state.stop = None;
    state.detected = false;
    drop(state);
    inner.emit(false);
}

fn clear_fuse(inner: &Inner, generation: u64) {
    let mut state = inner.lock();
    if state.fuse.as_ref().is_some_and(|t| t.generation == generation) {
        state.fuse = None;
        debug!("fuse cleared");
    }
}

// ── Motion sensor accessory ──────────────────────────────────────────

/// Motion-only accessory: one read-only `MotionDetected` characteristic
/// driven by a [`MotionFilter`].
#[derive(Debug)]
pub struct MotionSensor {
    name: String,
    filter: MotionFilter,
}

impl MotionSensor {
    pub fn new(name: impl Into<String>, timings: MotionTimings, registry: &dyn CapabilityRegistry) -> Self {
        let name = name.into();
        registry.information(&name, &AccessoryInfo::motion_sensor(&name));
        let handle = registry.characteristic(&name, CharacteristicKind::MotionDetected);
        if let Some(handle) = &handle {
            handle.update_value(HostValue::Detected(false));
        }
        Self {
            filter: MotionFilter::new(timings, handle),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host read: the stable signal.
    pub fn get(&self) -> bool {
        let detected = self.filter.is_detected();
        debug!(sensor = %self.name, detected, "motion get");
        detected
    }

    pub fn update(&self, raw: bool) -> Transition {
        self.filter.update(raw)
    }

    pub fn filter(&self) -> &MotionFilter {
        &self.filter
    }
}
