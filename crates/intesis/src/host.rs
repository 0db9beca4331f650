//! Terminal-side characteristic registry.
//!
//! Every characteristic the core wires is backed by a handle that forwards
//! pushed values into one channel, so `watch` and `motion` can print them
//! as they arrive.

use std::sync::Arc;

use tokio::sync::mpsc;

use intesis_core::{
    AccessoryInfo, CapabilityRegistry, CharacteristicHandle, CharacteristicKind, HostValue,
    TemperatureBounds,
};

/// One value pushed by the core.
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub accessory: String,
    pub kind: CharacteristicKind,
    pub value: HostValue,
}

/// Registry whose handles forward into an unbounded channel.
pub struct ChannelRegistry {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelRegistry {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CapabilityRegistry for ChannelRegistry {
    fn characteristic(
        &self,
        accessory: &str,
        kind: CharacteristicKind,
    ) -> Option<Arc<dyn CharacteristicHandle>> {
        Some(Arc::new(ChannelHandle {
            accessory: accessory.to_owned(),
            kind,
            tx: self.tx.clone(),
        }))
    }

    fn information(&self, accessory: &str, info: &AccessoryInfo) {
        tracing::debug!(
            accessory,
            manufacturer = %info.manufacturer,
            model = %info.model,
            serial = %info.serial_number,
            "accessory registered"
        );
    }
}

struct ChannelHandle {
    accessory: String,
    kind: CharacteristicKind,
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl CharacteristicHandle for ChannelHandle {
    fn update_value(&self, value: HostValue) {
        // Receiver gone means the command is shutting down.
        let _ = self.tx.send(HostEvent {
            accessory: self.accessory.clone(),
            kind: self.kind,
            value,
        });
    }

    fn set_temperature_bounds(&self, bounds: TemperatureBounds) {
        tracing::trace!(
            accessory = %self.accessory,
            kind = %self.kind,
            min = bounds.min,
            max = bounds.max,
            step = bounds.step,
            "temperature bounds"
        );
    }
}
