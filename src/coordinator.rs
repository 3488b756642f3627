//! # Top-level transfer coordination.
//!
//! [`Coordinator`] owns the shared state behind one async mutex and drives
//! each transfer through admission, the two externally visible phases, and
//! finalization. The lock is only ever held across short synchronous
//! policy sections — never across `prepare`, `perform`, or any of the
//! signalling waits — so slow transfers cannot stall admission of others.
//!
//! Lifecycle [`Event`]s fan out over a [`tokio::sync::broadcast`] channel;
//! use [`subscribe`](Coordinator::subscribe) for a raw receiver or
//! [`attach`](Coordinator::attach) to hook up an [`Observer`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, Semaphore};

use crate::config::Config;
use crate::error::{ConfigError, TransferError};
use crate::event::{Event, EventKind};
use crate::ids::{ComponentId, DeviceId};
use crate::observer::Observer;
use crate::state::{Admission, CoreState, Gate, Phases};
use crate::transfer::Transfer;

/// Coordinates concurrent component transfers across a fixed set of
/// bounded-capacity devices.
///
/// Construction fixes the device layout; afterwards any number of tasks may
/// call [`execute`](Coordinator::execute) concurrently (wrap the
/// coordinator in an [`Arc`] to share it).
pub struct Coordinator {
    state: Mutex<CoreState>,
    capacities: HashMap<DeviceId, usize>,
    /// Lifecycle event fan-out; dropped receivers are fine, a publish to
    /// no subscribers is a no-op.
    events: broadcast::Sender<Event>,
}

impl Coordinator {
    /// Builds a coordinator from the given layout.
    ///
    /// Fails when the layout names no devices, a device has zero slots, a
    /// component is placed on an unknown device, or a device is assigned
    /// more initial components than it has slots.
    pub fn new(cfg: Config) -> Result<Self, ConfigError> {
        let state = CoreState::build(&cfg)?;
        let (events, _) = broadcast::channel(cfg.bus_capacity);
        Ok(Self {
            state: Mutex::new(state),
            events,
            capacities: cfg.devices,
        })
    }

    /// Runs a transfer to completion.
    ///
    /// Validation happens first, in a fixed precedence (first failure
    /// wins):
    ///
    /// 1. neither endpoint named;
    /// 2. unknown source device, then unknown destination device;
    /// 3. adding a component that already exists;
    /// 4. moving/removing a component not on the claimed source;
    /// 5. destination equals the component's current device;
    /// 6. the component is busy with another transfer.
    ///
    /// On a validation error neither callback runs and no state changed.
    /// Otherwise the transfer may wait for a destination slot (removals
    /// never do), and `prepare` and `perform` each run exactly once on the
    /// calling task. `perform` only starts once the destination slot's
    /// previous occupant has finished its own `prepare`.
    pub async fn execute(&self, transfer: &dyn Transfer) -> Result<(), TransferError> {
        let admission = {
            let mut state = self.state.lock().await;
            if let Err(err) = state.validate(transfer) {
                self.publish(
                    transfer_event(EventKind::TransferRejected, transfer)
                        .with_error(err.to_string()),
                );
                return Err(err);
            }
            match transfer.destination() {
                None => state.admit_remove(transfer.component()),
                Some(destination) => {
                    state.admit_toward(transfer.component(), transfer.source(), destination)
                }
            }
        };

        let phases = match admission {
            Admission::Ready(phases) => {
                match phases.rotation {
                    Some(participants) => self.publish(
                        transfer_event(EventKind::RotationReleased, transfer)
                            .with_participants(participants),
                    ),
                    None => self.publish(transfer_event(EventKind::TransferAdmitted, transfer)),
                }
                phases
            }
            Admission::Parked(wake) => {
                self.publish(transfer_event(EventKind::TransferQueued, transfer));
                acquire(&wake).await;
                let phases = self.state.lock().await.resume(transfer.component());
                self.publish(transfer_event(EventKind::TransferResumed, transfer));
                phases
            }
        };

        self.run_phases(transfer, phases).await;
        Ok(())
    }

    /// Returns the device a component currently resides on.
    ///
    /// A component mid-transfer still reports its old device until the
    /// transfer completes.
    pub async fn locate(&self, component: ComponentId) -> Option<DeviceId> {
        self.state.lock().await.locate(component)
    }

    /// Slot count of a device, or `None` for an unknown id.
    pub fn capacity(&self, device: DeviceId) -> Option<usize> {
        self.capacities.get(&device).copied()
    }

    /// Subscribes to the lifecycle event stream.
    ///
    /// Only events published after the call are delivered; a receiver that
    /// falls more than the configured bus capacity behind starts lagging
    /// and skips the oldest events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Spawns a background listener feeding events to the observer.
    pub fn attach<O>(&self, observer: O)
    where
        O: Observer + Send + Sync + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                observer.on_event(&ev).await;
            }
        });
    }

    /// Drives `prepare` and `perform` with the hand-off discipline in
    /// between:
    ///
    /// 1. `prepare` stages the transfer;
    /// 2. the `prepared` signal lets a rotation successor proceed;
    /// 3. the vacated source slot is handed to whoever inherits it;
    /// 4. the gate waits for the destination slot's previous occupant to
    ///    finish staging (hand-off), or — inside a rotation — for the
    ///    predecessor's `prepared` signal;
    /// 5. `perform` lands the component.
    async fn run_phases(&self, transfer: &dyn Transfer, phases: Phases) {
        transfer.prepare().await;
        phases.prepared.add_permits(1);
        if let Some(handoff) = phases.vacated {
            handoff.add_permits(1);
        }
        match phases.gate {
            Some(Gate::Slot(handoff)) => acquire(&handoff).await,
            Some(Gate::Rotation(prepared)) => acquire(&prepared).await,
            None => {}
        }
        transfer.perform().await;

        self.state
            .lock()
            .await
            .settle(transfer.component(), transfer.destination());
        self.publish(transfer_event(EventKind::TransferCompleted, transfer));
    }

    /// Fans an event out to all current subscribers; nobody listening is
    /// not an error.
    fn publish(&self, ev: Event) {
        let _ = self.events.send(ev);
    }
}

/// Consumes one permit, treating a closed semaphore as the unrecoverable
/// runtime fault it is: the coordinator never closes its semaphores.
async fn acquire(sem: &Arc<Semaphore>) {
    sem.acquire()
        .await
        .expect("coordination semaphores are never closed")
        .forget();
}

fn transfer_event(kind: EventKind, transfer: &dyn Transfer) -> Event {
    let mut ev = Event::now(kind).with_component(transfer.component());
    if let Some(device) = transfer.source() {
        ev = ev.with_source(device);
    }
    if let Some(device) = transfer.destination() {
        ev = ev.with_destination(device);
    }
    ev
}
