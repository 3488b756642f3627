//! # Identifiers for devices and components.
//!
//! Both are thin `u32` newtypes so they stay `Copy` and cheap to use as map
//! keys throughout the coordinator.
//!
//! # Example
//! ```
//! use storvisor::{ComponentId, DeviceId};
//!
//! let dev = DeviceId::new(3);
//! let comp = ComponentId::from(7);
//!
//! assert_eq!(dev.raw(), 3);
//! assert_eq!(comp.to_string(), "7");
//! ```

use std::fmt;

/// Identity of a storage device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u32);

impl DeviceId {
    /// Wraps a raw device number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw device number.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for DeviceId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a stored component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32);

impl ComponentId {
    /// Wraps a raw component number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw component number.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ComponentId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
