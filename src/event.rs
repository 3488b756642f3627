use std::time::SystemTime;

use crate::ids::{ComponentId, DeviceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    TransferAdmitted,
    TransferQueued,
    TransferResumed,
    RotationReleased,
    TransferCompleted,
    TransferRejected,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub component: Option<ComponentId>,
    pub source: Option<DeviceId>,
    pub destination: Option<DeviceId>,
    pub error: Option<String>,
    pub participants: Option<usize>,
    pub kind: EventKind,
    pub at: SystemTime,
}

impl Event {
    pub fn now(kind: EventKind) -> Self {
        Self {
            kind,
            at: SystemTime::now(),
            component: None,
            source: None,
            destination: None,
            error: None,
            participants: None,
        }
    }

    pub fn with_component(mut self, component: ComponentId) -> Self {
        self.component = Some(component);
        self
    }

    pub fn with_source(mut self, device: DeviceId) -> Self {
        self.source = Some(device);
        self
    }

    pub fn with_destination(mut self, device: DeviceId) -> Self {
        self.destination = Some(device);
        self
    }

    pub fn with_error(mut self, msg: impl Into<String>) -> Self {
        self.error = Some(msg.into());
        self
    }

    pub fn with_participants(mut self, n: usize) -> Self {
        self.participants = Some(n);
        self
    }
}
