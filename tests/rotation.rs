//! Rotation tests: cyclic swap patterns that would deadlock under plain
//! queueing are detected and released together, with every `perform` held
//! until the predecessor's `prepare` has signalled vacancy.

mod common;

use std::sync::Arc;

use common::{comp, dev, recorded, silent, wait_for, within, PhaseLog};
use storvisor::{Config, Coordinator, EventKind};

fn full_ring(devices: u32) -> Coordinator {
    // Device n holds component n+1, every device single-slot.
    let mut cfg = Config::new();
    for n in 0..devices {
        cfg = cfg
            .with_device(dev(n), 1)
            .with_component(comp(n + 1), dev(n));
    }
    Coordinator::new(cfg).expect("layout is valid")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_full_devices_swap_their_components() {
    let coordinator = Arc::new(full_ring(2));
    let mut events = coordinator.subscribe();
    let log = PhaseLog::new();

    let first = recorded(&log, comp(1), Some(dev(0)), Some(dev(1)));
    let parked = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.execute(first.as_ref()).await })
    };
    wait_for(&mut events, EventKind::TransferQueued, comp(1)).await;

    let counter = recorded(&log, comp(2), Some(dev(1)), Some(dev(0)));
    within(coordinator.execute(counter.as_ref()))
        .await
        .expect("closing move");
    within(parked).await.expect("join").expect("parked move");

    assert_eq!(coordinator.locate(comp(1)).await, Some(dev(1)));
    assert_eq!(coordinator.locate(comp(2)).await, Some(dev(0)));

    // Neither component lands before the other has staged out.
    log.assert_before("prepare:1", "perform:2");
    log.assert_before("prepare:2", "perform:1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn closing_transfer_reports_the_rotation() {
    let coordinator = Arc::new(full_ring(2));
    let mut events = coordinator.subscribe();

    let first = silent(comp(1), Some(dev(0)), Some(dev(1)));
    let parked = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.execute(first.as_ref()).await })
    };
    wait_for(&mut events, EventKind::TransferQueued, comp(1)).await;

    let counter = silent(comp(2), Some(dev(1)), Some(dev(0)));
    within(coordinator.execute(counter.as_ref()))
        .await
        .expect("closing move");
    within(parked).await.expect("join").expect("parked move");

    let released = wait_for(&mut events, EventKind::RotationReleased, comp(2)).await;
    assert_eq!(released.participants, Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_party_rotation_completes() {
    let coordinator = Arc::new(full_ring(3));
    let mut events = coordinator.subscribe();
    let log = PhaseLog::new();

    // 1: 0→1 and 2: 1→2 park; 3: 2→0 closes the loop.
    for (id, from, to) in [(1, 0, 1), (2, 1, 2)] {
        let transfer = recorded(&log, comp(id), Some(dev(from)), Some(dev(to)));
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.execute(transfer.as_ref()).await });
        wait_for(&mut events, EventKind::TransferQueued, comp(id)).await;
    }

    let closing = recorded(&log, comp(3), Some(dev(2)), Some(dev(0)));
    within(coordinator.execute(closing.as_ref()))
        .await
        .expect("closing move");
    for id in [1, 2] {
        wait_for(&mut events, EventKind::TransferCompleted, comp(id)).await;
    }

    assert_eq!(coordinator.locate(comp(1)).await, Some(dev(1)));
    assert_eq!(coordinator.locate(comp(2)).await, Some(dev(2)));
    assert_eq!(coordinator.locate(comp(3)).await, Some(dev(0)));

    // Every slot is used only after its occupant staged out.
    log.assert_before("prepare:1", "perform:3");
    log.assert_before("prepare:2", "perform:1");
    log.assert_before("prepare:3", "perform:2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn rotation_skips_unrelated_waiters() {
    // An add sits at the head of the queue the rotation passes through;
    // the participant behind it is taken by identity and the add keeps
    // waiting for real capacity.
    let coordinator = Arc::new(full_ring(2));
    let mut events = coordinator.subscribe();
    let log = PhaseLog::new();

    let add = recorded(&log, comp(9), None, Some(dev(1)));
    let parked_add = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.execute(add.as_ref()).await })
    };
    wait_for(&mut events, EventKind::TransferQueued, comp(9)).await;

    let first = recorded(&log, comp(1), Some(dev(0)), Some(dev(1)));
    let parked_move = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.execute(first.as_ref()).await })
    };
    wait_for(&mut events, EventKind::TransferQueued, comp(1)).await;

    let counter = recorded(&log, comp(2), Some(dev(1)), Some(dev(0)));
    within(coordinator.execute(counter.as_ref()))
        .await
        .expect("closing move");
    within(parked_move).await.expect("join").expect("parked move");

    // The rotation finished around the add.
    assert_eq!(coordinator.locate(comp(1)).await, Some(dev(1)));
    assert_eq!(coordinator.locate(comp(2)).await, Some(dev(0)));

    // Clearing a slot on device 1 finally admits the add.
    let evict = silent(comp(1), Some(dev(1)), None);
    within(coordinator.execute(evict.as_ref()))
        .await
        .expect("removal");
    within(parked_add).await.expect("join").expect("add lands");
    assert_eq!(coordinator.locate(comp(9)).await, Some(dev(1)));

    log.assert_before("perform:1", "perform:9");
}
