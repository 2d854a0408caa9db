use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use tokio::net::TcpListener;

use crate::application::LedgerService;
use crate::http;
use crate::storage::{LedgerStore, MemoryStore, PoolConfig, Repository, wait_until_ready};

/// Saldo - credit-limited account ledger over HTTP
#[derive(Parser, Debug)]
#[command(name = "saldo")]
#[command(about = "Records credits and debits against credit-limited accounts and serves extracts")]
#[command(version)]
pub struct Cli {
    /// Database URL
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:saldo.db?mode=rwc")]
    pub database: String,

    /// Address to listen on
    #[arg(short, long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Maximum pooled database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 75)]
    pub max_connections: u32,

    /// Connections kept open while idle
    #[arg(long, env = "DB_MIN_CONNECTIONS", default_value_t = 5)]
    pub min_connections: u32,

    /// Delay between database readiness checks, in milliseconds
    #[arg(long, env = "DB_RETRY_MS", default_value_t = 2000)]
    pub connect_retry_ms: u64,

    /// Give up after this many readiness checks (omit to wait forever)
    #[arg(long, env = "DB_CONNECT_ATTEMPTS")]
    pub connect_attempts: Option<u32>,

    /// Deadline for each store call, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    pub request_timeout_ms: u64,

    /// Keep all state in memory instead of the database
    #[arg(long)]
    pub memory: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Log level requested on the command line; `RUST_LOG` still takes precedence.
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            ..PoolConfig::default()
        }
    }

    /// Startup phase: build the store, wait until it answers, then migrate and seed.
    pub async fn open_store(&self) -> Result<Arc<dyn LedgerStore>> {
        if self.memory {
            log::info!("Using in-memory store");
            let store = MemoryStore::new();
            store.seed_default_accounts().await?;
            return Ok(Arc::new(store));
        }

        let repo = Repository::connect_lazy(&self.database, &self.pool_config())?;
        wait_until_ready(
            &repo,
            Duration::from_millis(self.connect_retry_ms),
            self.connect_attempts,
        )
        .await?;
        repo.migrate().await?;
        repo.seed_default_accounts().await?;
        Ok(Arc::new(repo))
    }

    pub async fn run(self) -> Result<()> {
        let store = self.open_store().await?;
        let service = LedgerService::new(store.clone())
            .with_request_timeout(Duration::from_millis(self.request_timeout_ms));

        let listener = TcpListener::bind(&self.bind)
            .await
            .with_context(|| format!("Failed to bind {}", self.bind))?;
        log::info!("Listening on {}", listener.local_addr()?);

        let served = axum::serve(listener, http::router(service))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error");

        store.close().await;
        log::info!("Store closed");
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
