use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{AccountId, BalanceAfter, Extract, NewTransaction};
use crate::storage::{LedgerStore, MemoryStore, PoolConfig, Repository, StoreError};

use super::{AppError, ensure_known_account};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Application service providing the ledger operations.
/// This is the interface the HTTP handlers (and tests) talk to.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    request_timeout: Duration,
}

impl LedgerService {
    /// Create a new ledger service on top of the given store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Bound every store call by `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Initialize a SQLite database at the given path, creating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url, &PoolConfig::default()).await?;
        Ok(Self::new(Arc::new(repo)))
    }

    /// A service backed by a fresh in-memory store with the default accounts.
    pub async fn in_memory() -> Result<Self, AppError> {
        let store = MemoryStore::new();
        store.seed_default_accounts().await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Apply a validated transaction to an account.
    pub async fn record_transaction(
        &self,
        account_id: AccountId,
        transaction: NewTransaction,
    ) -> Result<BalanceAfter, AppError> {
        ensure_known_account(account_id)?;
        self.with_deadline(self.store.apply_transaction(account_id, &transaction))
            .await
    }

    /// Balance snapshot plus the most recent transactions of an account.
    pub async fn extract(&self, account_id: AccountId) -> Result<Extract, AppError> {
        ensure_known_account(account_id)?;
        self.with_deadline(self.store.read_extract(account_id)).await
    }

    async fn with_deadline<T>(
        &self,
        operation: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.request_timeout, operation).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::Timeout(self.request_timeout)),
        }
    }
}
