//! # storvisor
//!
//! **Storvisor** is a lightweight storage transfer coordination library.
//!
//! It admits and orders concurrent *component transfers* — adds, moves,
//! and removals — across a fixed set of bounded-capacity devices, so that
//! capacity is never exceeded, blocked transfers wait FIFO per destination,
//! and cyclic swap patterns that would otherwise deadlock are detected and
//! released together. The crate is designed as a building block for
//! higher-level storage engines and migration tools.
//!
//! ## Features
//!
//! | Area             | Description                                                        | Key types / traits              |
//! |------------------|--------------------------------------------------------------------|---------------------------------|
//! | **Transfers**    | Define transfers as trait objects or closures, two async phases.   | [`Transfer`], [`TransferFn`]    |
//! | **Coordination** | Admission, slot hand-off, FIFO queues, rotation release.           | [`Coordinator`]                 |
//! | **Observer API** | Hook into transfer lifecycle events (logging, metrics, tests).     | [`Observer`], [`Event`]         |
//! | **Errors**       | Typed errors for construction and malformed requests.              | [`ConfigError`], [`TransferError`] |
//! | **Configuration**| Declare devices, slot counts, and initial placement.               | [`Config`]                      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] observer _(demo/reference only)_.
//!
//! ```
//! use storvisor::{ComponentId, Config, Coordinator, DeviceId, TransferFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::new()
//!         .with_device(DeviceId::new(0), 2)
//!         .with_device(DeviceId::new(1), 1)
//!         .with_component(ComponentId::new(7), DeviceId::new(0));
//!
//!     let coordinator = Coordinator::new(cfg)?;
//!
//!     // Relocate component 7; the closures are the two transfer phases.
//!     let transfer = TransferFn::arc(
//!         ComponentId::new(7),
//!         Some(DeviceId::new(0)),
//!         Some(DeviceId::new(1)),
//!         || async { /* stage the bytes off the source */ },
//!         || async { /* commit them on the destination */ },
//!     );
//!     coordinator.execute(transfer.as_ref()).await?;
//!
//!     assert_eq!(
//!         coordinator.locate(ComponentId::new(7)).await,
//!         Some(DeviceId::new(1)),
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ---

mod component;
mod config;
mod coordinator;
mod cycle;
mod device;
mod error;
mod event;
mod ids;
mod observer;
mod queue;
mod state;
mod transfer;

// ---- Public re-exports ----

pub use config::Config;
pub use coordinator::Coordinator;
pub use error::{ConfigError, TransferError};
pub use event::{Event, EventKind};
pub use ids::{ComponentId, DeviceId};
pub use observer::Observer;
pub use transfer::{Transfer, TransferFn, TransferKind, TransferRef};

// Optional: expose a simple built-in logging observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observer::LogWriter;
