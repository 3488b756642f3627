//! # Transfer abstraction and function-backed transfer implementation.
//!
//! This module defines the [`Transfer`] trait (async, two-phase) and a
//! convenient function-backed implementation [`TransferFn`]. The common
//! handle type is [`TransferRef`], an `Arc<dyn Transfer>` suitable for
//! sharing across tasks.
//!
//! A transfer names a component and up to two devices, and supplies the two
//! externally visible phases of the operation:
//!
//! - [`prepare`](Transfer::prepare) stages the work; once it returns, the
//!   source slot counts as logically vacated.
//! - [`perform`](Transfer::perform) completes the work on the destination.
//!
//! Both phases run on the task that called
//! [`execute`](crate::Coordinator::execute), each exactly once per accepted
//! transfer, and never while the coordinator holds its internal lock.

use std::{future::Future, sync::Mutex};

use async_trait::async_trait;

use crate::ids::{ComponentId, DeviceId};

/// # Shared handle to a transfer object.
pub type TransferRef = std::sync::Arc<dyn Transfer>;

/// The shape of a transfer, derived from which endpoints it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// No source: the component enters the system on the destination.
    Add,
    /// Both endpoints: the component relocates between devices.
    Move,
    /// No destination: the component leaves the system.
    Remove,
}

/// # Asynchronous, two-phase component transfer.
///
/// A `Transfer` exposes its endpoints and the `prepare`/`perform` pair the
/// coordinator drives. Implementations must tolerate the phases being
/// separated by an arbitrary wait: the coordinator may suspend between them
/// until the destination slot is physically vacated.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use storvisor::{ComponentId, DeviceId, Transfer};
///
/// struct Archive {
///     component: ComponentId,
///     from: DeviceId,
/// }
///
/// #[async_trait]
/// impl Transfer for Archive {
///     fn component(&self) -> ComponentId { self.component }
///
///     fn source(&self) -> Option<DeviceId> { Some(self.from) }
///
///     fn destination(&self) -> Option<DeviceId> { None }
///
///     async fn prepare(&self) { /* snapshot the bytes */ }
///
///     async fn perform(&self) { /* drop the live copy */ }
/// }
/// ```
#[async_trait]
pub trait Transfer: Send + Sync + 'static {
    /// Returns the component this transfer operates on.
    fn component(&self) -> ComponentId;

    /// Returns the device the component leaves, if any.
    fn source(&self) -> Option<DeviceId>;

    /// Returns the device the component enters, if any.
    fn destination(&self) -> Option<DeviceId>;

    /// First phase; after it returns the source slot counts as vacated.
    async fn prepare(&self);

    /// Second phase; runs once the destination slot is physically free.
    async fn perform(&self);

    /// Classifies the transfer by its endpoints.
    ///
    /// Returns `None` when neither endpoint is named; such requests are
    /// rejected by the coordinator before either phase runs.
    fn kind(&self) -> Option<TransferKind> {
        match (self.source(), self.destination()) {
            (None, None) => None,
            (None, Some(_)) => Some(TransferKind::Add),
            (Some(_), Some(_)) => Some(TransferKind::Move),
            (Some(_), None) => Some(TransferKind::Remove),
        }
    }
}

/// # Function-backed transfer implementation.
///
/// [`TransferFn`] wraps two closures producing the `prepare` and `perform`
/// futures. Each closure is protected by a [`Mutex`] so the `FnMut` can be
/// called through `&self`; the mutex is held only while the future is
/// created, never while it runs.
///
/// # Example
/// ```
/// use storvisor::{ComponentId, DeviceId, Transfer, TransferFn, TransferKind, TransferRef};
///
/// let t: TransferRef = TransferFn::arc(
///     ComponentId::new(7),
///     None,
///     Some(DeviceId::new(0)),
///     || async { /* stage */ },
///     || async { /* commit */ },
/// );
///
/// assert_eq!(t.kind(), Some(TransferKind::Add));
/// ```
pub struct TransferFn<P, FP, Q, FQ>
where
    P: FnMut() -> FP + Send + 'static,
    FP: Future<Output = ()> + Send + 'static,
    Q: FnMut() -> FQ + Send + 'static,
    FQ: Future<Output = ()> + Send + 'static,
{
    component: ComponentId,
    source: Option<DeviceId>,
    destination: Option<DeviceId>,
    /// Produces the `prepare` future (guarded to allow `FnMut` with `&self`).
    prepare: Mutex<P>,
    /// Produces the `perform` future.
    perform: Mutex<Q>,
}

impl<P, FP, Q, FQ> TransferFn<P, FP, Q, FQ>
where
    P: FnMut() -> FP + Send + 'static,
    FP: Future<Output = ()> + Send + 'static,
    Q: FnMut() -> FQ + Send + 'static,
    FQ: Future<Output = ()> + Send + 'static,
{
    /// Creates a new function-backed transfer.
    ///
    /// Prefer [`TransferFn::arc`] when you immediately need a [`TransferRef`].
    pub fn new(
        component: ComponentId,
        source: Option<DeviceId>,
        destination: Option<DeviceId>,
        prepare: P,
        perform: Q,
    ) -> Self {
        Self {
            component,
            source,
            destination,
            prepare: Mutex::new(prepare),
            perform: Mutex::new(perform),
        }
    }

    /// Creates the transfer and returns it as a shared handle.
    pub fn arc(
        component: ComponentId,
        source: Option<DeviceId>,
        destination: Option<DeviceId>,
        prepare: P,
        perform: Q,
    ) -> TransferRef {
        std::sync::Arc::new(Self::new(component, source, destination, prepare, perform))
    }
}

#[async_trait]
impl<P, FP, Q, FQ> Transfer for TransferFn<P, FP, Q, FQ>
where
    P: FnMut() -> FP + Send + 'static,
    FP: Future<Output = ()> + Send + 'static,
    Q: FnMut() -> FQ + Send + 'static,
    FQ: Future<Output = ()> + Send + 'static,
{
    fn component(&self) -> ComponentId {
        self.component
    }

    fn source(&self) -> Option<DeviceId> {
        self.source
    }

    fn destination(&self) -> Option<DeviceId> {
        self.destination
    }

    async fn prepare(&self) {
        let fut = {
            let mut prepare = match self.prepare.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            (prepare)()
        };
        fut.await;
    }

    async fn perform(&self) {
        let fut = {
            let mut perform = match self.perform.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            (perform)()
        };
        fut.await;
    }
}
