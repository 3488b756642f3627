use async_trait::async_trait;

use crate::event::Event;
#[cfg(feature = "logging")]
use crate::event::EventKind;

#[async_trait]
pub trait Observer {
    async fn on_event(&self, event: &Event);
}

/// Observer that prints one stdout line per transfer lifecycle event:
/// admissions, queueing and resumption, rotation releases, completions,
/// and rejections, each tagged with the component and device ids involved.
///
/// Only built with the `logging` feature; meant as a reference
/// implementation of [`Observer`], not a production log sink.
#[cfg(feature = "logging")]
pub struct LogWriter;

#[cfg(feature = "logging")]
#[async_trait]
impl Observer for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::TransferAdmitted => {
                println!(
                    "[admitted] component={:?} src={:?} dst={:?}",
                    e.component, e.source, e.destination
                );
            }
            EventKind::TransferQueued => {
                println!(
                    "[queued] component={:?} dst={:?}",
                    e.component, e.destination
                );
            }
            EventKind::TransferResumed => {
                println!(
                    "[resumed] component={:?} dst={:?}",
                    e.component, e.destination
                );
            }
            EventKind::RotationReleased => {
                println!(
                    "[rotation] component={:?} participants={:?}",
                    e.component, e.participants
                );
            }
            EventKind::TransferCompleted => {
                println!(
                    "[completed] component={:?} src={:?} dst={:?}",
                    e.component, e.source, e.destination
                );
            }
            EventKind::TransferRejected => {
                println!("[rejected] component={:?} err={:?}", e.component, e.error);
            }
        }
    }
}
