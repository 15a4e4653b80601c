//! # Serve fan-in: one forwarder per serving service, one aggregated stream.
//!
//! ```text
//! serve()
//!   ├─► forwarder(svc A) ─► serve() → Completed(err?)  ─► err forwarded once ──┐
//!   ├─► forwarder(svc B) ─► serve() → Streaming(s)     ─► every item of s ─────┼──► mpsc ──► run loop
//!   └─► forwarder(svc C) ─► serve() panics             ─► ServePanicked ───────┘
//! ```
//!
//! ## Rules
//! - Each forwarder owns one clone of the sender; the stream closes when the last
//!   forwarder drops it, i.e. after every serve has finished.
//! - No ordering across services.
//! - If the run loop drops the receiver, forwarders stop forwarding.
//! - There is no cancellation: a serve that never returns, or a stream that never
//!   ends, keeps the aggregated stream open.

use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;

use crate::{
    core::registry::ServiceHandle,
    error::{LifecycleError, ServiceError, panic_message},
    events::{Bus, Event, EventKind},
    services::Serving,
};

/// Runs one service's serve work and forwards its outcome(s) to `tx`.
pub(crate) async fn forward(handle: ServiceHandle, tx: mpsc::Sender<LifecycleError>, bus: Bus) {
    let work = forward_outcomes(&handle, &tx, &bus);
    if let Err(panic) = std::panic::AssertUnwindSafe(work).catch_unwind().await {
        let info = panic_message(&*panic);
        bus.publish(
            Event::new(EventKind::ServeFailed)
                .with_service(handle.shared_name())
                .with_reason(format!("panicked: {info}")),
        );
        let _ = tx
            .send(LifecycleError::ServePanicked {
                service: handle.name().to_owned(),
                info,
            })
            .await;
    }
}

async fn forward_outcomes(handle: &ServiceHandle, tx: &mpsc::Sender<LifecycleError>, bus: &Bus) {
    let Some(servable) = handle.service().servable() else {
        return;
    };
    bus.publish(Event::new(EventKind::ServeStarting).with_service(handle.shared_name()));

    match servable.serve().await {
        Serving::Completed(None) => {}
        Serving::Completed(Some(err)) => {
            report(handle, tx, bus, err).await;
        }
        Serving::Streaming(mut errors) => {
            while let Some(err) = errors.next().await {
                if !report(handle, tx, bus, err).await {
                    break;
                }
            }
        }
    }
    bus.publish(Event::new(EventKind::ServeCompleted).with_service(handle.shared_name()));
}

/// Forwards one error; returns `false` once nobody is reading anymore.
async fn report(
    handle: &ServiceHandle,
    tx: &mpsc::Sender<LifecycleError>,
    bus: &Bus,
    err: ServiceError,
) -> bool {
    bus.publish(
        Event::new(EventKind::ServeFailed)
            .with_service(handle.shared_name())
            .with_reason(err.to_string()),
    );
    tx.send(LifecycleError::Serve {
        service: handle.name().to_owned(),
        source: err,
    })
    .await
    .is_ok()
}
