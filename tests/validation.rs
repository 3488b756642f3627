//! Validation and construction failure tests: every rejection tag, the
//! precedence between them, and the layout checks at construction time.

mod common;

use std::sync::Arc;

use common::{comp, dev, held, silent, wait_for, within};
use storvisor::{Config, ConfigError, Coordinator, EventKind, TransferError};
use tokio::sync::Semaphore;

fn small_system() -> Coordinator {
    Coordinator::new(
        Config::new()
            .with_device(dev(0), 2)
            .with_device(dev(1), 1)
            .with_component(comp(1), dev(0)),
    )
    .expect("layout is valid")
}

#[tokio::test]
async fn rejects_transfer_without_endpoints() {
    let coordinator = small_system();
    let t = silent(comp(1), None, None);
    assert_eq!(
        coordinator.execute(t.as_ref()).await,
        Err(TransferError::IllegalTransferType { component: comp(1) }),
    );
}

#[tokio::test]
async fn unknown_source_wins_over_unknown_destination() {
    let coordinator = small_system();
    let t = silent(comp(1), Some(dev(7)), Some(dev(8)));
    assert_eq!(
        coordinator.execute(t.as_ref()).await,
        Err(TransferError::DeviceDoesNotExist { device: dev(7) }),
    );
}

#[tokio::test]
async fn rejects_unknown_destination_device() {
    let coordinator = small_system();
    let t = silent(comp(1), Some(dev(0)), Some(dev(8)));
    assert_eq!(
        coordinator.execute(t.as_ref()).await,
        Err(TransferError::DeviceDoesNotExist { device: dev(8) }),
    );
}

#[tokio::test]
async fn rejects_adding_an_existing_component() {
    let coordinator = small_system();
    let t = silent(comp(1), None, Some(dev(1)));
    assert_eq!(
        coordinator.execute(t.as_ref()).await,
        Err(TransferError::ComponentAlreadyExists {
            component: comp(1),
            device: dev(1),
        }),
    );
}

#[tokio::test]
async fn duplicate_add_onto_current_device_reports_already_exists() {
    // The duplicate-component check outranks the needless-transfer check.
    let coordinator = small_system();
    let t = silent(comp(1), None, Some(dev(0)));
    assert_eq!(
        coordinator.execute(t.as_ref()).await,
        Err(TransferError::ComponentAlreadyExists {
            component: comp(1),
            device: dev(0),
        }),
    );
}

#[tokio::test]
async fn rejects_moving_an_unknown_component() {
    let coordinator = small_system();
    let t = silent(comp(9), Some(dev(0)), Some(dev(1)));
    assert_eq!(
        coordinator.execute(t.as_ref()).await,
        Err(TransferError::ComponentDoesNotExist {
            component: comp(9),
            device: dev(0),
        }),
    );
}

#[tokio::test]
async fn rejects_moving_from_the_wrong_source() {
    let coordinator = small_system();
    let t = silent(comp(1), Some(dev(1)), Some(dev(0)));
    assert_eq!(
        coordinator.execute(t.as_ref()).await,
        Err(TransferError::ComponentDoesNotExist {
            component: comp(1),
            device: dev(1),
        }),
    );
}

#[tokio::test]
async fn rejects_moving_onto_the_current_device() {
    let coordinator = small_system();
    let t = silent(comp(1), Some(dev(0)), Some(dev(0)));
    assert_eq!(
        coordinator.execute(t.as_ref()).await,
        Err(TransferError::ComponentDoesNotNeedTransfer {
            component: comp(1),
            device: dev(0),
        }),
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejects_a_component_already_in_flight() {
    let coordinator = Arc::new(small_system());
    let mut events = coordinator.subscribe();

    let release = Arc::new(Semaphore::new(0));
    let slow = held(comp(1), Some(dev(0)), Some(dev(1)), release.clone());
    let driver = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.execute(slow.as_ref()).await })
    };
    wait_for(&mut events, EventKind::TransferAdmitted, comp(1)).await;

    let second = silent(comp(1), Some(dev(0)), Some(dev(1)));
    assert_eq!(
        coordinator.execute(second.as_ref()).await,
        Err(TransferError::ComponentIsBeingOperatedOn { component: comp(1) }),
    );

    release.add_permits(1);
    within(driver).await.expect("join").expect("transfer runs");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_parked_transfer_still_owns_its_component() {
    // Device 1 is full, so the add parks; the component is busy meanwhile.
    let coordinator = Arc::new(
        Coordinator::new(
            Config::new()
                .with_device(dev(0), 1)
                .with_device(dev(1), 1)
                .with_component(comp(1), dev(1)),
        )
        .expect("layout is valid"),
    );
    let mut events = coordinator.subscribe();

    let parked = silent(comp(3), None, Some(dev(1)));
    let driver = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.execute(parked.as_ref()).await })
    };
    wait_for(&mut events, EventKind::TransferQueued, comp(3)).await;

    // An arriving component reports its destination as residence.
    let second = silent(comp(3), Some(dev(1)), Some(dev(0)));
    assert_eq!(
        coordinator.execute(second.as_ref()).await,
        Err(TransferError::ComponentIsBeingOperatedOn { component: comp(3) }),
    );

    // Unblock the parked add by clearing a slot on its destination.
    let evict = silent(comp(1), Some(dev(1)), None);
    coordinator.execute(evict.as_ref()).await.expect("removal");
    within(driver).await.expect("join").expect("add lands");
}

#[test]
fn construction_requires_at_least_one_device() {
    let err = Coordinator::new(Config::new()).err();
    assert_eq!(err, Some(ConfigError::NoDevices));
}

#[test]
fn construction_rejects_a_zero_slot_device() {
    let err = Coordinator::new(Config::new().with_device(dev(0), 0)).err();
    assert_eq!(err, Some(ConfigError::ZeroCapacity { device: dev(0) }));
}

#[test]
fn construction_rejects_placement_on_unknown_device() {
    let err = Coordinator::new(
        Config::new()
            .with_device(dev(0), 1)
            .with_component(comp(1), dev(9)),
    )
    .err();
    assert_eq!(
        err,
        Some(ConfigError::UnknownDevice {
            component: comp(1),
            device: dev(9),
        }),
    );
}

#[test]
fn construction_rejects_an_overfilled_device() {
    let err = Coordinator::new(
        Config::new()
            .with_device(dev(0), 1)
            .with_component(comp(1), dev(0))
            .with_component(comp(2), dev(0)),
    )
    .err();
    assert_eq!(err, Some(ConfigError::Overfilled { device: dev(0) }));
}

#[test]
fn error_labels_are_stable() {
    let busy = TransferError::ComponentIsBeingOperatedOn { component: comp(1) };
    assert_eq!(busy.as_label(), "transfer_component_busy");
    assert_eq!(ConfigError::NoDevices.as_label(), "config_no_devices");
}
