//! # Per-component location and in-flight metadata.
//!
//! [`ComponentState`] records where a component currently sits, where its
//! in-flight transfer (if any) is taking it, and the two signalling handles
//! that transfer uses: the `prepared` semaphore released when its `prepare`
//! returns, and — for rotation participants only — a clone of the
//! predecessor's `prepared` semaphore to gate `perform` on.
//!
//! The current slot is an `Option`: an admitted add has a device but no
//! slot until the chain walk assigns one.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::ids::DeviceId;

pub(crate) struct ComponentState {
    device: DeviceId,
    slot: Option<usize>,
    pending_device: Option<DeviceId>,
    pending_slot: Option<usize>,
    in_operation: bool,
    prepared: Arc<Semaphore>,
    rotation_pred: Option<Arc<Semaphore>>,
}

impl ComponentState {
    /// State for a component already resident on a device.
    pub fn resident(device: DeviceId, slot: usize) -> Self {
        Self {
            device,
            slot: Some(slot),
            pending_device: None,
            pending_slot: None,
            in_operation: false,
            prepared: Arc::new(Semaphore::new(0)),
            rotation_pred: None,
        }
    }

    /// State for a component entering the system; no slot until assigned.
    pub fn arriving(device: DeviceId) -> Self {
        Self {
            slot: None,
            ..Self::resident(device, 0)
        }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn in_operation(&self) -> bool {
        self.in_operation
    }

    /// Flags the component busy and arms a fresh `prepared` semaphore.
    ///
    /// Arming per transfer keeps a signal from an earlier transfer of the
    /// same component from ever satisfying a later rotation.
    pub fn begin_operation(&mut self) {
        self.in_operation = true;
        self.prepared = Arc::new(Semaphore::new(0));
        self.rotation_pred = None;
        self.pending_device = None;
        self.pending_slot = None;
    }

    /// Records the destination the in-flight transfer will land on.
    pub fn assign(&mut self, device: DeviceId, slot: usize) {
        self.pending_device = Some(device);
        self.pending_slot = Some(slot);
    }

    /// Returns the assigned destination, once the chain walk has set it.
    pub fn assignment(&self) -> Option<(DeviceId, usize)> {
        match (self.pending_device, self.pending_slot) {
            (Some(device), Some(slot)) => Some((device, slot)),
            _ => None,
        }
    }

    /// Handle to this transfer's `prepared` semaphore.
    pub fn prepared(&self) -> Arc<Semaphore> {
        self.prepared.clone()
    }

    pub fn set_rotation_pred(&mut self, prepared: Arc<Semaphore>) {
        self.rotation_pred = Some(prepared);
    }

    pub fn rotation_pred(&self) -> Option<Arc<Semaphore>> {
        self.rotation_pred.clone()
    }

    /// Settles the component on its assigned destination and clears the
    /// in-flight metadata.
    pub fn commit(&mut self) {
        if let Some(device) = self.pending_device.take() {
            self.device = device;
            self.slot = self.pending_slot.take();
        }
        self.in_operation = false;
        self.rotation_pred = None;
    }
}
