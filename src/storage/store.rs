use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Account, AccountId, BalanceAfter, Cents, Extract, NewTransaction};

/// Tagged outcome of a store operation that did not succeed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error(
        "Insufficient credit in account {account_id}: balance {balance}, limit {limit}, requested {requested}"
    )]
    InsufficientFunds {
        account_id: AccountId,
        balance: Cents,
        limit: Cents,
        requested: Cents,
    },

    #[error("Store error: {0}")]
    Infrastructure(#[from] anyhow::Error),
}

/// Persisted account and transaction state.
///
/// Implementations must apply a transaction as one atomic conditional update: the
/// balance changes only if the new value still respects the credit limit, and the
/// transaction row is committed together with it or not at all.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Apply a transaction to an account and return the resulting balance and limit.
    async fn apply_transaction(
        &self,
        account_id: AccountId,
        transaction: &NewTransaction,
    ) -> Result<BalanceAfter, StoreError>;

    /// Current balance plus the most recent transactions, newest first.
    async fn read_extract(&self, account_id: AccountId) -> Result<Extract, StoreError>;

    /// Point read of a single account.
    async fn account(&self, account_id: AccountId) -> Result<Option<Account>>;

    /// Insert or replace an account.
    async fn provision_account(&self, account: &Account) -> Result<()>;

    /// Insert an account unless one with the same id exists. Returns true if inserted.
    async fn provision_if_absent(&self, account: &Account) -> Result<bool>;

    /// One round trip to the backend.
    async fn ping(&self) -> Result<()>;

    /// Release backend resources. The store must not be used afterwards.
    async fn close(&self);

    /// Provision the deployment's default accounts, leaving existing ones untouched.
    async fn seed_default_accounts(&self) -> Result<()> {
        for account in Account::defaults() {
            if self.provision_if_absent(&account).await? {
                log::info!(
                    "Provisioned account {} with limit {}",
                    account.id,
                    account.limit
                );
            }
        }
        Ok(())
    }
}

/// Poll the store until it answers, sleeping `interval` between attempts.
/// With `max_attempts` of `None` this waits forever.
pub async fn wait_until_ready(
    store: &dyn LedgerStore,
    interval: Duration,
    max_attempts: Option<u32>,
) -> Result<()> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match store.ping().await {
            Ok(()) => {
                log::info!("Database connected after {} attempt(s)", attempt);
                return Ok(());
            }
            Err(e) => {
                log::warn!("Database connection error: {:#}", e);
                if max_attempts.is_some_and(|max| attempt >= max) {
                    bail!("Database not reachable after {} attempt(s): {:#}", attempt, e);
                }
                log::warn!("Retrying in {:?}", interval);
                tokio::time::sleep(interval).await;
            }
        }
    }
}
