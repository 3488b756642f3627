//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, Semaphore};

use storvisor::{ComponentId, DeviceId, Event, EventKind, TransferFn, TransferRef};

pub fn dev(n: u32) -> DeviceId {
    DeviceId::new(n)
}

pub fn comp(n: u32) -> ComponentId {
    ComponentId::new(n)
}

/// Records phase completions so tests can assert cross-transfer ordering.
#[derive(Clone, Default)]
pub struct PhaseLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl PhaseLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> usize {
        self.entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{entry} not recorded; log was {:?}", self.entries()))
    }

    pub fn assert_before(&self, earlier: &str, later: &str) {
        assert!(
            self.position(earlier) < self.position(later),
            "expected {earlier} before {later}; log was {:?}",
            self.entries(),
        );
    }
}

/// Transfer that records `prepare:<id>` and `perform:<id>` into the log.
pub fn recorded(
    log: &PhaseLog,
    component: ComponentId,
    source: Option<DeviceId>,
    destination: Option<DeviceId>,
) -> TransferRef {
    let prepare_log = log.clone();
    let perform_log = log.clone();
    TransferFn::arc(
        component,
        source,
        destination,
        move || {
            let log = prepare_log.clone();
            async move { log.note(format!("prepare:{component}")) }
        },
        move || {
            let log = perform_log.clone();
            async move { log.note(format!("perform:{component}")) }
        },
    )
}

/// Transfer with no observable phases.
pub fn silent(
    component: ComponentId,
    source: Option<DeviceId>,
    destination: Option<DeviceId>,
) -> TransferRef {
    TransferFn::arc(component, source, destination, || async {}, || async {})
}

/// Transfer whose `prepare` blocks until `release` receives a permit.
pub fn held(
    component: ComponentId,
    source: Option<DeviceId>,
    destination: Option<DeviceId>,
    release: Arc<Semaphore>,
) -> TransferRef {
    TransferFn::arc(
        component,
        source,
        destination,
        move || {
            let release = release.clone();
            async move {
                release
                    .acquire()
                    .await
                    .expect("test semaphore stays open")
                    .forget();
            }
        },
        || async {},
    )
}

/// Awaits a future, failing the test if it misses the deadline. Guards
/// every potentially-blocking step so a coordination bug surfaces as a
/// test failure instead of a hung run.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), fut)
        .await
        .expect("future missed the 5s deadline")
}

/// Waits until the bus reports `kind` for `component`.
pub async fn wait_for(
    rx: &mut broadcast::Receiver<Event>,
    kind: EventKind,
    component: ComponentId,
) -> Event {
    within(async {
        loop {
            let ev = rx.recv().await.expect("event bus closed");
            if ev.kind == kind && ev.component == Some(component) {
                return ev;
            }
        }
    })
    .await
}
