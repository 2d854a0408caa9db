use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, anyhow, ensure};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::{
    Account, AccountId, BalanceAfter, EXTRACT_LEN, Extract, NewTransaction, Transaction,
    TransactionId,
};

use super::{LedgerStore, StoreError};

#[derive(Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<AccountId, Vec<Transaction>>,
    last_id: TransactionId,
}

/// A thread-safe in-memory ledger store.
///
/// The conditional balance update and the transaction append happen under a single
/// lock acquisition. Nothing survives the process; meant for development and tests.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Same constraints the SQL schema enforces on the accounts table.
fn check_account(account: &Account) -> Result<()> {
    ensure!(
        account.limit >= 0,
        "Credit limit of account {} must not be negative: {}",
        account.id,
        account.limit
    );
    ensure!(
        account.is_within_limit(),
        "Balance {} of account {} is below its limit {}",
        account.balance,
        account.id,
        account.limit
    );
    Ok(())
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn apply_transaction(
        &self,
        account_id: AccountId,
        transaction: &NewTransaction,
    ) -> Result<BalanceAfter, StoreError> {
        let mut state = self.state.lock().await;

        let account = state
            .accounts
            .get_mut(&account_id)
            .ok_or(StoreError::AccountNotFound(account_id))?;

        let delta = transaction.delta();
        let balance = match account.balance_after(delta) {
            Some(balance) => balance,
            None if delta > 0 && account.balance.checked_add(delta).is_none() => {
                return Err(anyhow!("Balance overflow on account {}", account_id).into());
            }
            None => {
                return Err(StoreError::InsufficientFunds {
                    account_id,
                    balance: account.balance,
                    limit: account.limit,
                    requested: transaction.value,
                });
            }
        };
        account.balance = balance;
        let limit = account.limit;

        state.last_id += 1;
        let recorded = Transaction {
            id: state.last_id,
            account_id,
            value: transaction.value,
            direction: transaction.direction,
            description: transaction.description.clone(),
            created_at: Utc::now(),
        };
        state
            .transactions
            .entry(account_id)
            .or_default()
            .push(recorded);

        Ok(BalanceAfter { balance, limit })
    }

    async fn read_extract(&self, account_id: AccountId) -> Result<Extract, StoreError> {
        let state = self.state.lock().await;

        let account = state
            .accounts
            .get(&account_id)
            .ok_or(StoreError::AccountNotFound(account_id))?;

        let transactions = state
            .transactions
            .get(&account_id)
            .map(|history| history.iter().rev().take(EXTRACT_LEN).cloned().collect())
            .unwrap_or_default();

        Ok(Extract {
            balance: account.balance,
            limit: account.limit,
            taken_at: Utc::now(),
            transactions,
        })
    }

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.get(&account_id).copied())
    }

    async fn provision_account(&self, account: &Account) -> Result<()> {
        check_account(account)?;
        let mut state = self.state.lock().await;
        state.accounts.insert(account.id, *account);
        Ok(())
    }

    async fn provision_if_absent(&self, account: &Account) -> Result<bool> {
        check_account(account)?;
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&account.id) {
            return Ok(false);
        }
        state.accounts.insert(account.id, *account);
        Ok(true)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;

    async fn store_with(account: Account) -> MemoryStore {
        let store = MemoryStore::new();
        store.provision_account(&account).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_apply_updates_balance_and_history() {
        let store = store_with(Account::new(1, 1000)).await;

        let after = store
            .apply_transaction(1, &NewTransaction::debit(500, "rent").unwrap())
            .await
            .unwrap();
        assert_eq!(after, BalanceAfter { balance: -500, limit: 1000 });

        let extract = store.read_extract(1).await.unwrap();
        assert_eq!(extract.balance, -500);
        assert_eq!(extract.transactions.len(), 1);
        assert_eq!(extract.transactions[0].direction, Direction::Debit);
    }

    #[tokio::test]
    async fn test_rejected_debit_changes_nothing() {
        let store = store_with(Account::new(1, 100)).await;

        let err = store
            .apply_transaction(1, &NewTransaction::debit(101, "too much").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientFunds { balance: 0, limit: 100, requested: 101, .. }
        ));

        let extract = store.read_extract(1).await.unwrap();
        assert_eq!(extract.balance, 0);
        assert!(extract.transactions.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_account_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .apply_transaction(9, &NewTransaction::credit(1, "x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AccountNotFound(9)));
        assert!(matches!(
            store.read_extract(9).await.unwrap_err(),
            StoreError::AccountNotFound(9)
        ));
    }

    #[tokio::test]
    async fn test_overflow_is_infrastructure_error() {
        let store = store_with(Account::new(1, 0).with_balance(i64::MAX)).await;
        let err = store
            .apply_transaction(1, &NewTransaction::credit(1, "x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn test_overflowing_debit_is_insufficient_funds() {
        let store = store_with(Account::new(1, 10).with_balance(-2)).await;
        let err = store
            .apply_transaction(1, &NewTransaction::debit(i64::MAX, "x").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientFunds { .. }));
    }

    #[tokio::test]
    async fn test_provision_rejects_invalid_accounts() {
        let store = MemoryStore::new();
        assert!(store.provision_account(&Account::new(1, -1)).await.is_err());
        assert!(
            store
                .provision_if_absent(&Account::new(2, 10).with_balance(-11))
                .await
                .is_err()
        );
        assert!(store.account(1).await.unwrap().is_none());
        assert!(store.account(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_provision_if_absent_keeps_existing() {
        let store = store_with(Account::new(1, 5).with_balance(3)).await;
        assert!(!store.provision_if_absent(&Account::new(1, 100)).await.unwrap());
        assert_eq!(store.account(1).await.unwrap(), Some(Account::new(1, 5).with_balance(3)));

        store.seed_default_accounts().await.unwrap();
        assert_eq!(store.account(2).await.unwrap(), Some(Account::new(2, 80_000)));
        assert_eq!(store.account(1).await.unwrap().unwrap().limit, 5);
    }
}
