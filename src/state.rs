//! # The shared state machine behind the coordinator.
//!
//! Everything here runs under the coordinator's single lock: validation,
//! admission, slot reservation, the wake chain, rotation release, and the
//! bookkeeping a woken transfer reads back. Nothing in this module blocks;
//! the signalling handles it returns ([`Phases`]) are awaited by the caller
//! only after the lock is dropped.
//!
//! # High-level flow
//!
//! ```text
//!  execute ──► validate ──► admit ──┬─ remove: free slot, wake the chain
//!                                   ├─ slot free: reserve, wake the chain
//!                                   ├─ rotation: release the whole loop
//!                                   └─ otherwise: park in the wait queue
//! ```
//!
//! The wake chain is the heart of admission: one freed (or fresh) slot is
//! handed down a line of parked transfers, each inheriting the slot the one
//! before it is about to vacate. A rotation is the same walk with the
//! participants taken out of their queues by identity instead of from the
//! heads — and with no occupancy accounting at all, since a rotation only
//! permutes occupants.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::component::ComponentState;
use crate::config::Config;
use crate::cycle::find_rotation;
use crate::device::DeviceState;
use crate::error::{ConfigError, TransferError};
use crate::ids::{ComponentId, DeviceId};
use crate::queue::{WaitQueue, Waiter};
use crate::transfer::Transfer;

/// What a released transfer awaits between `prepare` and `perform`.
pub(crate) enum Gate {
    /// Acquire the destination slot's hand-off semaphore.
    Slot(Arc<Semaphore>),
    /// Await the rotation predecessor's `prepared` signal.
    Rotation(Arc<Semaphore>),
}

/// Signalling handles a transfer carries out of the lock.
pub(crate) struct Phases {
    /// Released once this transfer's `prepare` returns.
    pub prepared: Arc<Semaphore>,
    /// Hand-off of the vacated source slot, released after `prepare`.
    pub vacated: Option<Arc<Semaphore>>,
    /// Gate before `perform`; removals have none.
    pub gate: Option<Gate>,
    /// Number of transfers released together when a rotation closed.
    pub rotation: Option<usize>,
}

pub(crate) enum Admission {
    /// A slot is assigned; the caller drives both phases now.
    Ready(Phases),
    /// No slot and no rotation; suspend on this wake semaphore.
    Parked(Arc<Semaphore>),
}

/// One link of a wake chain.
struct Link {
    component: ComponentId,
    source: Option<DeviceId>,
    destination: DeviceId,
    wake: Option<Arc<Semaphore>>,
}

impl Link {
    fn from_waiter(waiter: Waiter) -> Self {
        Self {
            component: waiter.component,
            source: waiter.source,
            destination: waiter.destination,
            wake: Some(waiter.wake),
        }
    }
}

pub(crate) struct CoreState {
    devices: HashMap<DeviceId, DeviceState>,
    components: HashMap<ComponentId, ComponentState>,
    queues: HashMap<DeviceId, WaitQueue>,
}

impl CoreState {
    /// Builds the device/component tables from the layout, seeding initial
    /// placements.
    pub fn build(cfg: &Config) -> Result<Self, ConfigError> {
        if cfg.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        let mut devices = HashMap::new();
        let mut queues = HashMap::new();
        for (&device, &slots) in &cfg.devices {
            if slots == 0 {
                return Err(ConfigError::ZeroCapacity { device });
            }
            devices.insert(device, DeviceState::new(slots));
            queues.insert(device, WaitQueue::new());
        }
        let mut components = HashMap::new();
        for (&component, &device) in &cfg.placement {
            let Some(state) = devices.get_mut(&device) else {
                return Err(ConfigError::UnknownDevice { component, device });
            };
            let Some(slot) = state.seed() else {
                return Err(ConfigError::Overfilled { device });
            };
            components.insert(component, ComponentState::resident(device, slot));
        }
        Ok(Self {
            devices,
            components,
            queues,
        })
    }

    /// Checks a request against the current state; the first failing check
    /// wins.
    pub fn validate(&self, transfer: &dyn Transfer) -> Result<(), TransferError> {
        let component = transfer.component();
        if transfer.kind().is_none() {
            return Err(TransferError::IllegalTransferType { component });
        }
        if let Some(device) = transfer.source() {
            if !self.devices.contains_key(&device) {
                return Err(TransferError::DeviceDoesNotExist { device });
            }
        }
        if let Some(device) = transfer.destination() {
            if !self.devices.contains_key(&device) {
                return Err(TransferError::DeviceDoesNotExist { device });
            }
        }
        let resident = self.components.get(&component);
        match (transfer.source(), transfer.destination()) {
            (None, Some(device)) if resident.is_some() => {
                return Err(TransferError::ComponentAlreadyExists { component, device });
            }
            (Some(device), _) if resident.map(|c| c.device()) != Some(device) => {
                return Err(TransferError::ComponentDoesNotExist { component, device });
            }
            _ => {}
        }
        if let Some(state) = resident {
            if let Some(device) = transfer.destination() {
                if state.device() == device {
                    return Err(TransferError::ComponentDoesNotNeedTransfer { component, device });
                }
            }
            if state.in_operation() {
                return Err(TransferError::ComponentIsBeingOperatedOn { component });
            }
        }
        Ok(())
    }

    /// Admits a removal. Removals only free space, so they never wait: the
    /// vacated slot is offered to the head of the device's queue at once.
    pub fn admit_remove(&mut self, component: ComponentId) -> Admission {
        let state = self.component_mut(component);
        state.begin_operation();
        let prepared = state.prepared();
        let device = state.device();
        let slot = state.slot().expect("settled component occupies a slot");

        self.device_mut(device).mark_free(slot);
        let vacated = self.device_ref(device).handoff(slot);
        if let Some(head) = self.queue_mut(device).pop() {
            let wakes = self.promote(Link::from_waiter(head), slot, None);
            for wake in wakes {
                wake.add_permits(1);
            }
        }
        Admission::Ready(Phases {
            prepared,
            vacated: Some(vacated),
            gate: None,
            rotation: None,
        })
    }

    /// Admits an add or move: reserve a slot if one is open, otherwise try
    /// to close a rotation, otherwise park.
    pub fn admit_toward(
        &mut self,
        component: ComponentId,
        source: Option<DeviceId>,
        destination: DeviceId,
    ) -> Admission {
        if source.is_none() {
            self.components
                .insert(component, ComponentState::arriving(destination));
        }
        let state = self.component_mut(component);
        state.begin_operation();
        let prepared = state.prepared();
        let current_slot = state.slot();

        if let Some(pos) = self.device_mut(destination).try_reserve() {
            let wakes = self.promote(
                Link {
                    component,
                    source,
                    destination,
                    wake: None,
                },
                pos,
                None,
            );
            for wake in wakes {
                wake.add_permits(1);
            }
            let vacated = match (source, current_slot) {
                (Some(src), Some(slot)) => Some(self.device_ref(src).handoff(slot)),
                _ => None,
            };
            return Admission::Ready(Phases {
                prepared,
                vacated,
                gate: Some(Gate::Slot(self.device_ref(destination).handoff(pos))),
                rotation: None,
            });
        }

        if let Some(src) = source {
            if let Some(participants) = find_rotation(&self.queues, destination, src) {
                return Admission::Ready(self.release_rotation(
                    component,
                    src,
                    destination,
                    prepared,
                    participants,
                ));
            }
        }

        let wake = Arc::new(Semaphore::new(0));
        self.queue_mut(destination).push(Waiter {
            component,
            source,
            destination,
            wake: wake.clone(),
        });
        Admission::Parked(wake)
    }

    /// Rebuilds the signalling handles for a transfer woken from the queue.
    /// Its assignment was recorded by whoever released it.
    pub fn resume(&self, component: ComponentId) -> Phases {
        let state = self.component_ref(component);
        let (destination, slot) = state.assignment().expect("woken transfer has an assignment");
        let prepared = state.prepared();
        match state.rotation_pred() {
            Some(pred) => Phases {
                prepared,
                vacated: None,
                gate: Some(Gate::Rotation(pred)),
                rotation: None,
            },
            None => Phases {
                prepared,
                vacated: match state.slot() {
                    Some(pos) => Some(self.device_ref(state.device()).handoff(pos)),
                    None => None,
                },
                gate: Some(Gate::Slot(self.device_ref(destination).handoff(slot))),
                rotation: None,
            },
        }
    }

    /// Records the outcome of a finished transfer: the component settles on
    /// its destination, or leaves the system entirely.
    pub fn settle(&mut self, component: ComponentId, destination: Option<DeviceId>) {
        match destination {
            Some(_) => self.component_mut(component).commit(),
            None => {
                self.components.remove(&component);
            }
        }
    }

    /// Current device of a component, if it is stored at all.
    pub fn locate(&self, component: ComponentId) -> Option<DeviceId> {
        self.components.get(&component).map(|c| c.device())
    }

    /// Releases a detected rotation: every participant leaves its queue (by
    /// identity — it need not be at the head), inherits the slot of the one
    /// ahead of it in the loop, and gates its `perform` on that transfer's
    /// `prepared` signal.
    fn release_rotation(
        &mut self,
        component: ComponentId,
        source: DeviceId,
        destination: DeviceId,
        prepared: Arc<Semaphore>,
        participants: Vec<ComponentId>,
    ) -> Phases {
        // The first participant waits on this transfer's source device,
        // each next one on the source of the previous.
        let mut queue_device = source;
        let mut taken = VecDeque::new();
        for id in participants {
            let waiter = self
                .queue_mut(queue_device)
                .take(id)
                .expect("rotation participant is queued");
            queue_device = waiter
                .source
                .expect("rotation participants have a source");
            taken.push_back(waiter);
        }

        let count = taken.len() + 1;
        let closing = taken
            .back()
            .map(|w| w.component)
            .expect("a rotation has at least one queued participant");
        let pos = self
            .component_ref(closing)
            .slot()
            .expect("rotation participant occupies a slot");

        let wakes = self.promote(
            Link {
                component,
                source: Some(source),
                destination,
                wake: None,
            },
            pos,
            Some(taken),
        );
        for wake in wakes {
            wake.add_permits(1);
        }

        let gate = self
            .component_ref(component)
            .rotation_pred()
            .expect("rotation wires a predecessor");
        Phases {
            prepared,
            vacated: None,
            gate: Some(Gate::Rotation(gate)),
            rotation: Some(count),
        }
    }

    /// Walks a chain of transfers made runnable by one event, assigning
    /// each its destination slot and collecting the wake semaphores to
    /// release.
    ///
    /// The first link already holds (or closes a rotation onto) slot
    /// `first_pos`. Every further link comes from the head of the previous
    /// link's source-device queue — or, in rotation mode, from the detected
    /// loop — and inherits the slot the previous link is vacating. The walk
    /// stops at a link without a source, a link staying on its own device,
    /// or an empty queue.
    fn promote(
        &mut self,
        first: Link,
        first_pos: usize,
        mut rotation: Option<VecDeque<Waiter>>,
    ) -> Vec<Arc<Semaphore>> {
        let rotating = rotation.is_some();
        let first_component = first.component;
        let mut wakes = Vec::new();
        let mut link = first;
        let mut pos = first_pos;
        let mut prev_prepared: Option<Arc<Semaphore>> = None;

        loop {
            let state = self.component_mut(link.component);
            state.assign(link.destination, pos);
            if rotating {
                if let Some(pred) = prev_prepared.take() {
                    state.set_rotation_pred(pred);
                }
            }
            let vacating = state.slot();
            prev_prepared = Some(state.prepared());

            // A rotation permutes occupants without changing occupancy, so
            // only chain mode touches the books.
            if !rotating {
                self.device_mut(link.destination).mark_reserved(pos);
                if let (Some(src), Some(slot)) = (link.source, vacating) {
                    self.device_mut(src).mark_free(slot);
                }
            }
            if let Some(wake) = link.wake.take() {
                wakes.push(wake);
            }

            let Some(src) = link.source else { break };
            if src == link.destination {
                break;
            }
            let next = match rotation.as_mut() {
                Some(participants) => participants.pop_front(),
                None => self.queue_mut(src).pop(),
            };
            match next {
                Some(waiter) => {
                    pos = vacating.expect("a transfer with a source occupies a slot");
                    link = Link::from_waiter(waiter);
                }
                None => break,
            }
        }

        if rotating {
            // Close the loop: the requester's slot is vacated by the last
            // participant.
            if let Some(last) = prev_prepared {
                self.component_mut(first_component).set_rotation_pred(last);
            }
        }
        wakes
    }

    fn device_ref(&self, id: DeviceId) -> &DeviceState {
        self.devices
            .get(&id)
            .expect("device table is fixed at construction")
    }

    fn device_mut(&mut self, id: DeviceId) -> &mut DeviceState {
        self.devices
            .get_mut(&id)
            .expect("device table is fixed at construction")
    }

    fn component_ref(&self, id: ComponentId) -> &ComponentState {
        self.components
            .get(&id)
            .expect("transfer references a validated component")
    }

    fn component_mut(&mut self, id: ComponentId) -> &mut ComponentState {
        self.components
            .get_mut(&id)
            .expect("transfer references a validated component")
    }

    fn queue_mut(&mut self, id: DeviceId) -> &mut WaitQueue {
        self.queues
            .get_mut(&id)
            .expect("queue table is fixed at construction")
    }
}
