use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use crate::domain::{
    Account, AccountId, BalanceAfter, Direction, EXTRACT_LEN, Extract, NewTransaction, Transaction,
};

use super::{LedgerStore, MIGRATION_001_INITIAL, StoreError};

/// Connection pool sizing and lock waiting.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a writer waits for another writer's lock before failing
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 75,
            min_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// SQLite-backed ledger store.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn connect_options(database_url: &str, config: &PoolConfig) -> Result<SqliteConnectOptions> {
        Ok(SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout)
            .foreign_keys(true))
    }

    fn pool_options(config: &PoolConfig) -> SqlitePoolOptions {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
    }

    /// Build the pool without opening a connection. Reachability is established
    /// separately, see [`super::wait_until_ready`].
    pub fn connect_lazy(database_url: &str, config: &PoolConfig) -> Result<Self> {
        let options = Self::connect_options(database_url, config)?;
        Ok(Self::new(Self::pool_options(config).connect_lazy_with(options)))
    }

    /// Connect to a SQLite database at the given URL.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str, config: &PoolConfig) -> Result<Self> {
        let options = Self::connect_options(database_url, config)?;
        let pool = Self::pool_options(config)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect + migrate + default accounts).
    pub async fn init(database_url: &str, config: &PoolConfig) -> Result<Self> {
        let repo = Self::connect(database_url, config).await?;
        repo.migrate().await?;
        repo.seed_default_accounts().await?;
        Ok(repo)
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        Ok(Account {
            id: row.try_get("id").context("Invalid account id")?,
            balance: row.try_get("balance").context("Invalid account balance")?,
            limit: row.try_get("credit_limit").context("Invalid credit limit")?,
        })
    }

    fn row_to_balance(row: &sqlx::sqlite::SqliteRow) -> Result<BalanceAfter> {
        Ok(BalanceAfter {
            balance: row.try_get("balance").context("Invalid account balance")?,
            limit: row.try_get("credit_limit").context("Invalid credit limit")?,
        })
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let kind: String = row.try_get("kind").context("Invalid transaction kind")?;
        let created_at_str: String = row.try_get("created_at").context("Invalid created_at")?;

        Ok(Transaction {
            id: row.try_get("id").context("Invalid transaction id")?,
            account_id: row.try_get("account_id").context("Invalid account id")?,
            value: row.try_get("value").context("Invalid transaction value")?,
            direction: Direction::from_str(&kind)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind))?,
            description: row.try_get("description").context("Invalid description")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

/// Fixed-width RFC 3339 so that text order matches time order.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl LedgerStore for Repository {
    async fn apply_transaction(
        &self,
        account_id: AccountId,
        transaction: &NewTransaction,
    ) -> Result<BalanceAfter, StoreError> {
        let delta = transaction.delta();

        // Dropping `tx` on any early return rolls the unit of work back.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET balance = balance + ?
            WHERE id = ?
              AND balance + ? >= -credit_limit
              AND typeof(balance + ?) = 'integer'
            RETURNING balance, credit_limit
            "#,
        )
        .bind(delta)
        .bind(account_id)
        .bind(delta)
        .bind(delta)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to update balance")?;

        let Some(updated) = updated else {
            // The predicate failed: the account is missing, the limit would break, or the
            // sum left the integer range (SQLite would have stored it as REAL).
            let current = sqlx::query("SELECT id, balance, credit_limit FROM accounts WHERE id = ?")
                .bind(account_id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to fetch account")?;

            let Some(row) = current else {
                return Err(StoreError::AccountNotFound(account_id));
            };
            let account = Self::row_to_account(&row)?;
            if delta > 0 && account.balance.checked_add(delta).is_none() {
                return Err(anyhow::anyhow!("Balance overflow on account {}", account_id).into());
            }
            return Err(StoreError::InsufficientFunds {
                account_id,
                balance: account.balance,
                limit: account.limit,
                requested: transaction.value,
            });
        };
        let after = Self::row_to_balance(&updated)?;

        sqlx::query(
            r#"
            INSERT INTO transactions (account_id, value, kind, description, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account_id)
        .bind(transaction.value)
        .bind(transaction.direction.as_str())
        .bind(&transaction.description)
        .bind(encode_timestamp(Utc::now()))
        .execute(&mut *tx)
        .await
        .context("Failed to save transaction")?;

        tx.commit().await.context("Failed to commit transaction")?;

        Ok(after)
    }

    async fn read_extract(&self, account_id: AccountId) -> Result<Extract, StoreError> {
        let account = self
            .account(account_id)
            .await?
            .ok_or(StoreError::AccountNotFound(account_id))?;
        let taken_at = Utc::now();

        let rows = sqlx::query(
            r#"
            SELECT id, account_id, value, kind, description, created_at
            FROM transactions
            WHERE account_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(account_id)
        .bind(EXTRACT_LEN as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent transactions")?;

        let transactions = rows
            .iter()
            .map(Self::row_to_transaction)
            .collect::<Result<Vec<_>>>()?;

        Ok(Extract {
            balance: account.balance,
            limit: account.limit,
            taken_at,
            transactions,
        })
    }

    async fn account(&self, account_id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT id, balance, credit_limit FROM accounts WHERE id = ?")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        row.as_ref().map(Self::row_to_account).transpose()
    }

    async fn provision_account(&self, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, balance, credit_limit)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET balance = excluded.balance, credit_limit = excluded.credit_limit
            "#,
        )
        .bind(account.id)
        .bind(account.balance)
        .bind(account.limit)
        .execute(&self.pool)
        .await
        .context("Failed to provision account")?;
        Ok(())
    }

    async fn provision_if_absent(&self, account: &Account) -> Result<bool> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO accounts (id, balance, credit_limit) VALUES (?, ?, ?)")
                .bind(account.id)
                .bind(account.balance)
                .bind(account.limit)
                .execute(&self.pool)
                .await
                .context("Failed to provision account")?;
        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Failed to reach database")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
