//! Bus listener that feeds the [`SubscriberSet`].
//!
//! ```text
//! Bus.subscribe() ──► listener task ──► SubscriberSet::emit(&Event)
//!                          ▲
//!   close() ── oneshot ────┘  drain what is already queued, then SubscriberSet::shutdown()
//! ```
//!
//! The subscriber workers themselves publish overflow/panic events on the same bus,
//! so the broadcast channel never closes on its own; `close` is the only way out.

use tokio::sync::{
    broadcast::{self, error::RecvError, error::TryRecvError},
    oneshot,
};
use tokio::task::JoinHandle;

use crate::{
    events::{Bus, Event},
    subscribers::SubscriberSet,
};

pub(crate) struct EventListener {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl EventListener {
    /// Subscribes to `bus` now and forwards every later event to `set`.
    pub(crate) fn spawn(bus: &Bus, set: SubscriberSet) -> Self {
        let rx = bus.subscribe();
        let (stop, stop_rx) = oneshot::channel();
        let task = tokio::spawn(listen(rx, set, stop_rx));
        Self { stop, task }
    }

    /// Forwards the events already on the bus, then waits for the subscribers to finish them.
    pub(crate) async fn close(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.task.await {
            tracing::warn!(error = %err, "event listener task failed");
        }
    }
}

async fn listen(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            ev = rx.recv() => match ev {
                Ok(ev) => set.emit(&ev),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged behind the bus");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut stop => break,
        }
    }

    loop {
        match rx.try_recv() {
            Ok(ev) => set.emit(&ev),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event listener lagged behind the bus");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    set.shutdown().await;
}
