//! # Example: one failing serve stops every service
//!
//! `worker` fails shortly after it starts. With the default policy the run loop
//! treats that as a shutdown request: `cache` and `journal` are stopped in
//! registration order, and `journal` refuses, so the process exits with 1 and the
//! aggregated stop error.
//!
//! Run with: `cargo run --example serve_failure`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use servisor::{
    Config, LogWriter, Orchestrator, ServeFn, Service, ServiceError, ServiceRef, Serving,
    ShutdownReason, Stop,
};

struct Closable {
    name: &'static str,
    refuse: bool,
}

impl Service for Closable {
    fn name(&self) -> &str {
        self.name
    }
    fn stoppable(&self) -> Option<&dyn Stop> {
        Some(self)
    }
}

#[async_trait]
impl Stop for Closable {
    async fn stop(&self) -> Result<(), ServiceError> {
        if self.refuse {
            return Err(anyhow::anyhow!("{} still has unflushed entries", self.name).into());
        }
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut orch = Orchestrator::builder(Config::default())
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let worker = ServeFn::arc("worker", || async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Serving::failed(ServiceError::fatal("lost connection to queue"))
    });
    orch.register([
        Arc::new(Closable { name: "cache", refuse: false }) as ServiceRef,
        worker,
        Arc::new(Closable { name: "journal", refuse: true }),
    ])?;

    match orch.run().await {
        Ok(ShutdownReason::ServeFailed(err)) => {
            tracing::warn!(%err, "stopped after serve failure");
            Ok(())
        }
        Ok(reason) => {
            tracing::info!(reason = reason.as_label(), "shut down cleanly");
            Ok(())
        }
        Err(err) => {
            tracing::error!(label = err.as_label(), %err, "shutdown failed");
            std::process::exit(1);
        }
    }
}
