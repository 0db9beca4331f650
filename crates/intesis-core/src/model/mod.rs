// ── Domain model ──
//
// Canonical representation of the cloud configuration: devices, their
// services, and the snapshot that groups them.

pub mod device;
pub mod service;

pub use device::{ConfigSnapshot, DeviceRecord};
pub use service::{ServiceBounds, ServiceId, ServiceState};
