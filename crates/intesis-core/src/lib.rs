//! Synchronization core between `intesis-api` and a smart-home host.
//!
//! This crate owns the stateful parts of the bridge:
//!
//! - **[`CredentialManager`]**: acquires the OAuth2 token and keeps it
//!   alive with a single proactive refresh timer armed 30 seconds before
//!   expiry.
//!
//! - **[`ConfigCache`]**: TTL cache over the cloud configuration document.
//!   Concurrent stale reads coalesce into one in-flight fetch, and every
//!   successful fetch is pushed to the registered bridges before any caller
//!   resumes.
//!
//! - **[`DeviceBridge`]**: per-unit facade exposing get/set for each
//!   [`Capability`] through a static dispatch table, mapping values with the
//!   functions in [`mapping`].
//!
//! - **[`MotionFilter`]** / **[`MotionSensor`]**: debounce and
//!   start-after-stop fuse for a raw motion signal.
//!
//! - **[`Platform`]**: startup sequencing that wires all of the above.
//!
//! The host side is reached only through the [`CapabilityRegistry`] passed
//! in at construction; the remote side only through the [`CloudApi`] trait.

pub mod api;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod convert;
pub mod credentials;
pub mod error;
pub mod host;
pub mod mapping;
pub mod model;
pub mod motion;
pub mod platform;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::CloudApi;
pub use bridge::{Capability, DeviceBridge};
pub use cache::ConfigCache;
pub use config::BridgeConfig;
pub use credentials::{Credential, CredentialManager};
pub use error::CoreError;
pub use host::{
    AccessoryInfo, CapabilityRegistry, CharacteristicHandle, CharacteristicKind, HostValue,
    Unwired,
};
pub use mapping::{Activity, HostMode, TemperatureBounds};
pub use model::{ConfigSnapshot, DeviceRecord, ServiceBounds, ServiceId, ServiceState};
pub use motion::{MotionFilter, MotionPhase, MotionSensor, MotionTimings, Transition};
pub use platform::Platform;

/// HTTP client type used by [`Platform::connect`].
pub use intesis_api::IntesisClient;
