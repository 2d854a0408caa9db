use std::time::Duration;

use thiserror::Error;

use crate::domain::{AccountId, Cents, TransactionError};
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid account id: {0}")]
    InvalidAccountId(String),

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error(
        "Insufficient funds in account {account_id}: balance {balance}, limit {limit}, requested {requested}"
    )]
    InsufficientFunds {
        account_id: AccountId,
        balance: Cents,
        limit: Cents,
        requested: Cents,
    },

    #[error("Request exceeded its deadline of {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

/// Coarse classification used when mapping errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input; never reaches the store
    Validation,
    NotFound,
    InsufficientFunds,
    Infrastructure,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidAccountId(_) | AppError::InvalidTransaction(_) => {
                ErrorKind::Validation
            }
            AppError::AccountNotFound(_) => ErrorKind::NotFound,
            AppError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            AppError::Timeout(_) | AppError::Database(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => AppError::AccountNotFound(id),
            StoreError::InsufficientFunds {
                account_id,
                balance,
                limit,
                requested,
            } => AppError::InsufficientFunds {
                account_id,
                balance,
                limit,
                requested,
            },
            StoreError::Infrastructure(e) => AppError::Database(e),
        }
    }
}

impl From<TransactionError> for AppError {
    fn from(err: TransactionError) -> Self {
        AppError::InvalidTransaction(err.to_string())
    }
}
