//! # Demo: cyclic_swap
//!
//! Two single-slot devices, both full. Each component wants the other's
//! slot — plain queueing would deadlock, so the coordinator detects the
//! rotation and releases both transfers together.
//!
//! Demonstrates how to:
//! - Build a [`Coordinator`] from a [`Config`] layout.
//! - Drive transfers from concurrent tasks.
//! - Watch lifecycle events through [`Coordinator::subscribe`].
//!
//! ## Run
//! ```bash
//! cargo run --example cyclic_swap
//! ```

use std::sync::Arc;
use std::time::Duration;

use storvisor::{ComponentId, Config, Coordinator, DeviceId, TransferFn};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let left = DeviceId::new(0);
    let right = DeviceId::new(1);
    let x = ComponentId::new(1);
    let y = ComponentId::new(2);

    // 1. Two single-slot devices, both occupied.
    let cfg = Config::new()
        .with_device(left, 1)
        .with_device(right, 1)
        .with_component(x, left)
        .with_component(y, right);
    let coordinator = Arc::new(Coordinator::new(cfg)?);

    // 2. Print every lifecycle event.
    let mut events = coordinator.subscribe();
    tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            println!("[event] {:?} component={:?}", ev.kind, ev.component);
        }
    });

    // 3. x heads for the right device; it is full, so this transfer parks.
    let parked = {
        let coordinator = coordinator.clone();
        let transfer = TransferFn::arc(
            x,
            Some(left),
            Some(right),
            move || async move { println!("[x] staging out of the left device") },
            move || async move { println!("[x] landing on the right device") },
        );
        tokio::spawn(async move { coordinator.execute(transfer.as_ref()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // 4. y heads the other way and closes the rotation: both transfers run.
    let counter = TransferFn::arc(
        y,
        Some(right),
        Some(left),
        move || async move { println!("[y] staging out of the right device") },
        move || async move { println!("[y] landing on the left device") },
    );
    coordinator.execute(counter.as_ref()).await?;
    parked.await??;

    // 5. Placements swapped without ever exceeding one slot per device.
    println!("x now on device {:?}", coordinator.locate(x).await);
    println!("y now on device {:?}", coordinator.locate(y).await);
    Ok(())
}
