//! # Error types used by the coordinator.
//!
//! This module defines two error enums:
//!
//! - [`ConfigError`] errors raised while building a [`Coordinator`](crate::Coordinator)
//!   from a [`Config`](crate::Config).
//! - [`TransferError`] errors raised by [`execute`](crate::Coordinator::execute)
//!   when a transfer request is malformed.
//!
//! Both types provide an `as_label` helper returning a short stable tag for
//! logs/metrics. A [`TransferError`] is always surfaced before any state
//! change: neither `prepare` nor `perform` runs for a rejected transfer.

use thiserror::Error;

use crate::ids::{ComponentId, DeviceId};

/// # Errors produced while constructing a coordinator.
///
/// These represent an inconsistent initial layout and abort construction.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The layout names no devices at all.
    #[error("storage layout has no devices")]
    NoDevices,
    /// A device was declared with zero slots.
    #[error("device {device} has no slots")]
    ZeroCapacity {
        /// The offending device.
        device: DeviceId,
    },
    /// A component was placed on a device that is not part of the layout.
    #[error("component {component} is placed on unknown device {device}")]
    UnknownDevice {
        /// The misplaced component.
        component: ComponentId,
        /// The device id that does not exist.
        device: DeviceId,
    },
    /// More components were placed on a device than it has slots.
    #[error("device {device} is assigned more components than it has slots")]
    Overfilled {
        /// The over-provisioned device.
        device: DeviceId,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::NoDevices => "config_no_devices",
            ConfigError::ZeroCapacity { .. } => "config_zero_capacity",
            ConfigError::UnknownDevice { .. } => "config_unknown_device",
            ConfigError::Overfilled { .. } => "config_overfilled",
        }
    }
}

/// # Errors produced by transfer validation.
///
/// Checks run in a fixed order and the first failure wins; see
/// [`Coordinator::execute`](crate::Coordinator::execute) for the exact
/// precedence.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The transfer names neither a source nor a destination device.
    #[error("transfer for component {component} names neither a source nor a destination")]
    IllegalTransferType {
        /// The component of the malformed request.
        component: ComponentId,
    },
    /// A named device is not part of the system.
    #[error("device {device} does not exist")]
    DeviceDoesNotExist {
        /// The unknown device.
        device: DeviceId,
    },
    /// An add names a component that is already stored somewhere.
    #[error("component {component} already exists; cannot add it to device {device}")]
    ComponentAlreadyExists {
        /// The duplicated component.
        component: ComponentId,
        /// The requested destination.
        device: DeviceId,
    },
    /// A move/remove names a component that is not on the claimed source.
    #[error("component {component} does not reside on device {device}")]
    ComponentDoesNotExist {
        /// The missing component.
        component: ComponentId,
        /// The claimed source device.
        device: DeviceId,
    },
    /// The destination is the device the component already occupies.
    #[error("component {component} already resides on device {device}")]
    ComponentDoesNotNeedTransfer {
        /// The settled component.
        component: ComponentId,
        /// The requested (and current) device.
        device: DeviceId,
    },
    /// Another transfer for the same component is still in flight.
    #[error("component {component} is already being operated on")]
    ComponentIsBeingOperatedOn {
        /// The busy component.
        component: ComponentId,
    },
}

impl TransferError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransferError::IllegalTransferType { .. } => "transfer_illegal_type",
            TransferError::DeviceDoesNotExist { .. } => "transfer_unknown_device",
            TransferError::ComponentAlreadyExists { .. } => "transfer_component_exists",
            TransferError::ComponentDoesNotExist { .. } => "transfer_component_missing",
            TransferError::ComponentDoesNotNeedTransfer { .. } => "transfer_not_needed",
            TransferError::ComponentIsBeingOperatedOn { .. } => "transfer_component_busy",
        }
    }
}
