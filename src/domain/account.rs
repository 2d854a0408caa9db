use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::{Cents, within_limit};

pub type AccountId = i32;

/// Account ids served by this deployment. Anything outside is reported as not found
/// without consulting the store.
pub const KNOWN_ACCOUNT_IDS: RangeInclusive<AccountId> = 1..=5;

/// Accounts provisioned at startup when absent: (id, credit limit). All start at balance 0.
pub const DEFAULT_ACCOUNTS: [(AccountId, Cents); 5] = [
    (1, 100_000),
    (2, 80_000),
    (3, 1_000_000),
    (4, 10_000_000),
    (5, 500_000),
];

/// An account with a signed balance and a credit limit.
/// Invariant: `balance >= -limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Cents,
    /// How far below zero the balance may go (always non-negative)
    pub limit: Cents,
}

impl Account {
    pub fn new(id: AccountId, limit: Cents) -> Self {
        Self {
            id,
            balance: 0,
            limit,
        }
    }

    pub fn with_balance(mut self, balance: Cents) -> Self {
        self.balance = balance;
        self
    }

    /// The default deployment accounts, in id order.
    pub fn defaults() -> Vec<Account> {
        DEFAULT_ACCOUNTS
            .iter()
            .map(|&(id, limit)| Account::new(id, limit))
            .collect()
    }

    /// Balance after applying a signed delta, or `None` if the result would break the
    /// credit limit (or overflow).
    pub fn balance_after(&self, delta: Cents) -> Option<Cents> {
        self.balance
            .checked_add(delta)
            .filter(|&balance| within_limit(balance, self.limit))
    }

    pub fn is_within_limit(&self) -> bool {
        within_limit(self.balance, self.limit)
    }
}

/// True if the id belongs to the fixed set of accounts this deployment serves.
pub fn is_known_account(id: AccountId) -> bool {
    KNOWN_ACCOUNT_IDS.contains(&id)
}
