//! # Demo: rebalance
//!
//! A full device with a newcomer waiting on it. Moving a resident
//! component to a sibling device frees a slot, and the parked add inherits
//! it in the same wake chain.
//!
//! ## Run
//! ```bash
//! cargo run --example rebalance
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use storvisor::{ComponentId, Config, Coordinator, DeviceId, Event, Observer, TransferFn};

/// Minimal observer printing every lifecycle event.
struct Printer;

#[async_trait]
impl Observer for Printer {
    async fn on_event(&self, ev: &Event) {
        println!("[event] {:?} component={:?}", ev.kind, ev.component);
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let hot = DeviceId::new(0);
    let cold = DeviceId::new(1);

    // 1. The hot device is full; the cold one is empty.
    let cfg = Config::new()
        .with_device(hot, 2)
        .with_device(cold, 2)
        .with_component(ComponentId::new(1), hot)
        .with_component(ComponentId::new(2), hot);
    let coordinator = Arc::new(Coordinator::new(cfg)?);
    coordinator.attach(Printer);

    // 2. A newcomer targets the full device and parks.
    let newcomer = ComponentId::new(3);
    let parked = {
        let coordinator = coordinator.clone();
        let transfer = TransferFn::arc(
            newcomer,
            None,
            Some(hot),
            move || async move { println!("[3] fetching the new component") },
            move || async move { println!("[3] landing on the hot device") },
        );
        tokio::spawn(async move { coordinator.execute(transfer.as_ref()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    // 3. Rebalancing one resident to the cold device frees the slot the
    //    newcomer is waiting for.
    let rebalance = TransferFn::arc(
        ComponentId::new(1),
        Some(hot),
        Some(cold),
        move || async move { println!("[1] staging off the hot device") },
        move || async move { println!("[1] landing on the cold device") },
    );
    coordinator.execute(rebalance.as_ref()).await?;
    parked.await??;

    for id in [1, 2, 3] {
        let component = ComponentId::new(id);
        println!(
            "component {id} on device {:?}",
            coordinator.locate(component).await
        );
    }
    Ok(())
}
