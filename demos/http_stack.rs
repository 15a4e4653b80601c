//! # Example: settings, database and HTTP front end wired by type
//!
//! - `settings` provides `Arc<Settings>` and a greeting callable.
//! - `database` provides its `Arc<Pool>`, connects in `init` and closes in `stop`.
//! - `http` injects all three, serves until Ctrl-C and streams request errors.
//!
//! Serve errors are only logged (`on_serve_error = "log_only"`), so the process runs
//! until a signal arrives.
//!
//! Run with: `RUST_LOG=debug cargo run --example http_stack`

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;

use servisor::{
    Config, Init, InitHook, LogWriter, Orchestrator, Provider, Provision, Serve, Service,
    ServiceError, ServiceRef, Serving, Stop,
};

type Greeter = dyn Fn(&str) -> String + Send + Sync;

struct Settings {
    listen: String,
    greeting: String,
    pool_size: u32,
}

struct SettingsLoader {
    settings: Arc<Settings>,
}

impl Service for SettingsLoader {
    fn name(&self) -> &str {
        "settings"
    }
    fn provider(&self) -> Option<&dyn Provider> {
        Some(self)
    }
}

impl Provider for SettingsLoader {
    fn provide(&self) -> Vec<Provision> {
        let greeting = self.settings.greeting.clone();
        let greeter: Arc<Greeter> = Arc::new(move |who: &str| format!("{greeting}, {who}"));
        vec![
            Provision::instance(Arc::clone(&self.settings)),
            Provision::callable(greeter),
        ]
    }
}

/// Connection pool shared with the HTTP layer.
#[derive(Default)]
struct Pool {
    connected: AtomicBool,
    queries: AtomicU64,
}

impl Pool {
    fn query(&self) -> Result<u64, ServiceError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(ServiceError::fail("pool is closed"));
        }
        Ok(self.queries.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

struct Database {
    pool: Arc<Pool>,
}

impl Service for Database {
    fn name(&self) -> &str {
        "database"
    }
    fn provider(&self) -> Option<&dyn Provider> {
        Some(self)
    }
    fn initializer(&self) -> Option<&dyn InitHook> {
        Some(self)
    }
    fn stoppable(&self) -> Option<&dyn Stop> {
        Some(self)
    }
}

impl Provider for Database {
    fn provide(&self) -> Vec<Provision> {
        vec![Provision::instance(Arc::clone(&self.pool))]
    }
}

#[async_trait]
impl Init for Database {
    type Deps = Arc<Settings>;

    async fn init(&self, settings: Arc<Settings>) -> Result<(), ServiceError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        self.pool.connected.store(true, Ordering::Release);
        tracing::info!(pool_size = settings.pool_size, "database connected");
        Ok(())
    }
}

#[async_trait]
impl Stop for Database {
    async fn stop(&self) -> Result<(), ServiceError> {
        self.pool.connected.store(false, Ordering::Release);
        tracing::info!(
            queries = self.pool.queries.load(Ordering::Relaxed),
            "database closed"
        );
        Ok(())
    }
}

struct Wired {
    settings: Arc<Settings>,
    pool: Arc<Pool>,
    greeter: Arc<Greeter>,
}

#[derive(Default)]
struct Http {
    wired: Mutex<Option<Wired>>,
    halt: Mutex<Option<oneshot::Sender<()>>>,
}

impl Service for Http {
    fn name(&self) -> &str {
        "http"
    }
    fn initializer(&self) -> Option<&dyn InitHook> {
        Some(self)
    }
    fn servable(&self) -> Option<&dyn Serve> {
        Some(self)
    }
    fn stoppable(&self) -> Option<&dyn Stop> {
        Some(self)
    }
}

#[async_trait]
impl Init for Http {
    type Deps = (Arc<Settings>, Arc<Pool>, Arc<Greeter>);

    async fn init(&self, (settings, pool, greeter): Self::Deps) -> Result<(), ServiceError> {
        *self.wired.lock().map_err(|_| ServiceError::fatal("http state poisoned"))? = Some(Wired {
            settings,
            pool,
            greeter,
        });
        Ok(())
    }
}

#[async_trait]
impl Serve for Http {
    async fn serve(&self) -> Serving {
        let Some(wired) = self.wired.lock().ok().and_then(|mut w| w.take()) else {
            return Serving::failed(ServiceError::fatal("serve called before init"));
        };
        let (halt_tx, mut halt_rx) = oneshot::channel();
        if let Ok(mut halt) = self.halt.lock() {
            *halt = Some(halt_tx);
        }

        let (errors, rx) = mpsc::channel(8);
        tokio::spawn(async move {
            tracing::info!(listen = %wired.settings.listen, "http listening");
            let mut ticker = tokio::time::interval(Duration::from_millis(400));
            let mut request = 0u64;
            loop {
                tokio::select! {
                    _ = &mut halt_rx => break,
                    _ = ticker.tick() => {}
                }
                request += 1;
                let reply = (wired.greeter)(&format!("client-{request}"));
                let outcome = match request % 5 {
                    0 => Err(ServiceError::fail(format!("request {request}: upstream timeout"))),
                    _ => wired.pool.query(),
                };
                match outcome {
                    Ok(n) => tracing::debug!(request, query = n, reply = %reply, "handled"),
                    Err(err) => {
                        if errors.send(err).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Serving::from_receiver(rx)
    }
}

#[async_trait]
impl Stop for Http {
    async fn stop(&self) -> Result<(), ServiceError> {
        if let Some(halt) = self.halt.lock().ok().and_then(|mut h| h.take()) {
            let _ = halt.send(());
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::from_toml_str(
        r#"
        bus_capacity = 256
        on_serve_error = "log_only"
        "#,
    )?;

    let mut orch = Orchestrator::builder(cfg)
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();

    let settings = Arc::new(Settings {
        listen: "127.0.0.1:8080".into(),
        greeting: "hello".into(),
        pool_size: 8,
    });
    orch.register([
        Arc::new(Http::default()) as ServiceRef,
        Arc::new(Database {
            pool: Arc::new(Pool::default()),
        }),
        Arc::new(SettingsLoader { settings }),
    ])?;

    match orch.run().await {
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
