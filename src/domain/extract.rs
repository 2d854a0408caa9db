use chrono::{DateTime, Utc};

use super::{Cents, Transaction};

/// Number of transactions surfaced by an extract.
pub const EXTRACT_LEN: usize = 10;

/// Balance and limit right after a transaction was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAfter {
    pub balance: Cents,
    pub limit: Cents,
}

/// A point-in-time snapshot of an account: balance plus its most recent transactions,
/// newest first. Balance and list are read independently and may disagree under
/// concurrent writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extract {
    pub balance: Cents,
    pub limit: Cents,
    pub taken_at: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
}
