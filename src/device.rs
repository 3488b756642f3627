//! # Per-device occupancy bookkeeping.
//!
//! [`DeviceState`] tracks one device's slots under the coordinator lock:
//!
//! - `free` counts slots available for reservation. It is tentative: a slot
//!   counts as free from the moment its occupant's departure is scheduled,
//!   not when the departure finishes.
//! - `reservable` flags which slot indices back that count.
//! - `handoff` holds one semaphore per slot enforcing physical exclusion:
//!   a signalled slot (one permit) has been vacated by its previous
//!   occupant's `prepare`; an occupied slot holds no permit.
//!
//! Reservation (policy) and hand-off (physical) are deliberately separate
//! views: a successor may reserve a slot early and then block on the
//! hand-off semaphore until the departing component has actually staged out.

use std::sync::Arc;

use tokio::sync::Semaphore;

pub(crate) struct DeviceState {
    free: usize,
    reservable: Vec<bool>,
    handoff: Vec<Arc<Semaphore>>,
}

impl DeviceState {
    /// Creates a device with `slots` empty, signalled slots.
    pub fn new(slots: usize) -> Self {
        Self {
            free: slots,
            reservable: vec![true; slots],
            handoff: (0..slots).map(|_| Arc::new(Semaphore::new(1))).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.reservable.len()
    }

    #[cfg(test)]
    pub fn free_slots(&self) -> usize {
        self.free
    }

    /// Claims the first reservable slot, flagging it taken.
    ///
    /// Only the flag flips here; the matching count decrement happens when
    /// the chain walk assigns the slot via [`mark_reserved`](Self::mark_reserved).
    pub fn try_reserve(&mut self) -> Option<usize> {
        if self.free == 0 {
            return None;
        }
        let pos = self.reservable.iter().position(|open| *open)?;
        self.reservable[pos] = false;
        Some(pos)
    }

    /// Commits a reservation: decrements the free count and flags the slot.
    pub fn mark_reserved(&mut self, pos: usize) {
        debug_assert!(self.free > 0, "reserving on a device with no free slots");
        self.free -= 1;
        self.reservable[pos] = false;
    }

    /// Returns a slot to the reservable pool (tentatively, from the moment
    /// its occupant's departure is scheduled).
    pub fn mark_free(&mut self, pos: usize) {
        debug_assert!(self.free < self.capacity(), "freeing beyond capacity");
        self.free += 1;
        self.reservable[pos] = true;
    }

    /// Returns the hand-off semaphore of a slot.
    pub fn handoff(&self, pos: usize) -> Arc<Semaphore> {
        self.handoff[pos].clone()
    }

    /// Reserves a slot for a component placed at construction time.
    ///
    /// Occupied slots hold no hand-off permit, so the fresh permit is
    /// drained here. Returns `None` when the device is over-provisioned.
    pub fn seed(&mut self) -> Option<usize> {
        let pos = self.try_reserve()?;
        self.free -= 1;
        self.handoff[pos]
            .try_acquire()
            .expect("hand-off of a never-occupied slot is signalled")
            .forget();
        Some(pos)
    }
}
