use {
    crate::{
        config::{CofferServerConfig, StoreBackend},
        http_server::{SharedLedger, start_http_service},
        ledger::{Ledger, interface::LedgerInterface},
        metrics::handler::MetricsPusher,
        persistence::{MemoryStore, SqliteStore, StoreError},
    },
    std::{sync::Arc, time::Duration},
    tokio::signal::ctrl_c,
    tracing::{error, info},
};

pub mod config;
pub mod http_server;
pub mod ledger;
pub mod logging;
mod macros;
pub mod metrics;
pub mod models;
pub mod persistence;

pub struct Coffer {
    pub config: CofferServerConfig,
    ledger: SharedLedger,
}

impl Coffer {
    pub fn new(config: CofferServerConfig) -> Result<Self, StoreError> {
        let ledger: SharedLedger = match config.persistence.backend {
            StoreBackend::Sqlite => {
                let store = SqliteStore::new(
                    &config.persistence.db_path,
                    Duration::from_millis(config.persistence.busy_timeout_ms),
                )?;
                Arc::new(Ledger::new(store))
            }
            StoreBackend::Memory => {
                info!("Using in-memory store; accounts are lost on shutdown");
                Arc::new(Ledger::new(MemoryStore::new()))
            }
        };

        Ok(Coffer { config, ledger })
    }

    pub fn ledger(&self) -> SharedLedger {
        Arc::clone(&self.ledger)
    }

    pub async fn run(&mut self) -> Result<(), String> {
        let (shutdown_sender, _) = tokio::sync::broadcast::channel::<()>(1);
        let mut services = tokio::task::JoinSet::new();

        match self.ledger.list_accounts() {
            Ok(accounts) => info!("Initializing with {} accounts", accounts.len()),
            Err(e) => return Err(format!("Failed to read accounts at startup: {e}")),
        }

        {
            let http_ledger = self.ledger();
            let http_config = self.config.http.clone();
            let shutdown_receiver = shutdown_sender.subscribe();
            services.spawn(async move {
                start_http_service(http_config, http_ledger, shutdown_receiver).await
            });
        }

        if let Some(metrics_config) = self.config.metrics.clone() {
            let shutdown_receiver = shutdown_sender.subscribe();
            let registry = prometheus::default_registry().clone();
            let pusher = MetricsPusher::new(metrics_config, registry);
            services.spawn(pusher.run(shutdown_receiver));
        }

        tokio::select! {
            _ = ctrl_c() => {
                tracing::info!("Shutdown signal received, stopping services...");
                shutdown_sender.send(()).map_err(|e| e.to_string())?;

                while let Some(res) = services.join_next().await {
                    if let Err(e) = res {
                        error!("Service ended abnormally: {:?}", e);
                    }
                }

                tracing::info!("All services stopped");
            }
            Some(res) = services.join_next() => {
                error!("Service exited unexpectedly: {:?}", res);
                shutdown_sender.send(()).ok();
                services.abort_all();
            }
        }

        Ok(())
    }
}
