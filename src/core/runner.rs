//! # Run loop: init, serve, wait, stop.
//!
//! ```text
//! run_until(shutdown)
//!   ├─► init()                         → Err: returned as-is, stop is not run
//!   ├─► serve()                        → aggregated error stream
//!   ├─► loop select! {
//!   │     shutdown fires              → Signal (or Err(Signal) if listening failed)
//!   │     stream yields err           → policy Shutdown: ServeFailed(err)
//!   │                                   policy LogOnly:  log and keep waiting
//!   │     stream closes               → ServicesFinished
//!   │   }
//!   ├─► stop()                         always, whatever ended the loop
//!   └─► close_subscribers()            flush pending events
//! ```
//!
//! A stop failure wins over everything else in the returned result.

use std::future::Future;
use std::io;

use tokio::sync::mpsc;

use crate::{core::orchestrator::Orchestrator, error::LifecycleError, os_signals};

/// Why the run loop stopped waiting and began the stop phase.
#[derive(Debug)]
pub enum ShutdownReason {
    /// The shutdown future (an OS signal for [`Orchestrator::run`]) fired.
    Signal,
    /// A service reported a serve error and the policy is
    /// [`ServeErrorPolicy::Shutdown`](crate::ServeErrorPolicy::Shutdown).
    ServeFailed(LifecycleError),
    /// Every serve finished and the aggregated stream closed.
    ServicesFinished,
}

impl ShutdownReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownReason::Signal => "signal",
            ShutdownReason::ServeFailed(_) => "serve_failed",
            ShutdownReason::ServicesFinished => "services_finished",
        }
    }
}

impl Orchestrator {
    /// Runs the whole lifecycle until SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere).
    ///
    /// See [`Orchestrator::run_until`].
    pub async fn run(self) -> Result<ShutdownReason, LifecycleError> {
        self.run_until(os_signals::wait_for_shutdown_signal()).await
    }

    /// Runs init, serve and the wait loop, then always stops every service.
    ///
    /// `shutdown` stands in for the OS signal. Returns the reason the loop ended, or
    /// the stop failure if any service failed to stop. An init failure is returned
    /// directly and no service is stopped.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<ShutdownReason, LifecycleError>
    where
        F: Future<Output = io::Result<()>>,
    {
        if let Err(err) = self.init().await {
            self.close_subscribers().await;
            return Err(err);
        }

        let errors = match self.serve() {
            Ok(errors) => errors,
            Err(err) => {
                self.close_subscribers().await;
                return Err(err);
            }
        };
        let waited = self.wait(errors, shutdown).await;
        let reason = match &waited {
            Ok(reason) => reason.as_label(),
            Err(err) => err.as_label(),
        };
        self.request_shutdown(reason);

        let stopped = self.stop().await;
        self.close_subscribers().await;

        stopped?;
        waited
    }

    async fn wait<F>(
        &self,
        mut errors: mpsc::Receiver<LifecycleError>,
        shutdown: F,
    ) -> Result<ShutdownReason, LifecycleError>
    where
        F: Future<Output = io::Result<()>>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                res = &mut shutdown => {
                    return res.map(|()| ShutdownReason::Signal).map_err(LifecycleError::Signal);
                }
                next = errors.recv() => match next {
                    None => return Ok(ShutdownReason::ServicesFinished),
                    Some(err) if self.cfg.on_serve_error.stops_on_error() => {
                        return Ok(ShutdownReason::ServeFailed(err));
                    }
                    Some(err) => {
                        tracing::warn!(
                            target: "servisor",
                            service = err.service().unwrap_or("-"),
                            err = %err,
                            "serve error ignored by policy"
                        );
                    }
                },
            }
        }
    }
}
