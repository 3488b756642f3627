//! # Initial storage layout and runtime knobs.
//!
//! [`Config`] describes the system handed to
//! [`Coordinator::new`](crate::Coordinator::new): the fixed set of devices
//! with their slot counts, the components already resident on them, and the
//! capacity of the event bus.
//!
//! # Example
//! ```
//! use storvisor::{ComponentId, Config, DeviceId};
//!
//! let cfg = Config::new()
//!     .with_device(DeviceId::new(0), 4)
//!     .with_device(DeviceId::new(1), 2)
//!     .with_component(ComponentId::new(10), DeviceId::new(0))
//!     .with_bus_capacity(256);
//!
//! assert_eq!(cfg.devices.len(), 2);
//! assert_eq!(cfg.placement.len(), 1);
//! ```

use std::collections::HashMap;

use crate::ids::{ComponentId, DeviceId};

/// Construction inputs for a [`Coordinator`](crate::Coordinator).
///
/// Devices are fixed for the coordinator's lifetime; components may be
/// added, moved, and removed afterwards through transfers.
#[derive(Clone, Debug)]
pub struct Config {
    /// Slot count per device. Every device needs at least one slot.
    pub devices: HashMap<DeviceId, usize>,
    /// Components already stored at construction, keyed to their device.
    pub placement: HashMap<ComponentId, DeviceId>,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl Config {
    /// Creates an empty layout with the default bus capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a device with the given number of slots.
    pub fn with_device(mut self, device: DeviceId, slots: usize) -> Self {
        self.devices.insert(device, slots);
        self
    }

    /// Places a component on a device before the system starts.
    pub fn with_component(mut self, component: ComponentId, device: DeviceId) -> Self {
        self.placement.insert(component, device);
        self
    }

    /// Overrides the event bus channel capacity.
    pub fn with_bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }
}

impl Default for Config {
    /// Provides an empty layout with `bus_capacity = 1024`.
    fn default() -> Self {
        Self {
            devices: HashMap::new(),
            placement: HashMap::new(),
            bus_capacity: 1024,
        }
    }
}
