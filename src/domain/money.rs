/// Money is represented as integer minor units (cents) to avoid floating-point precision issues.
/// Balances are signed; values and credit limits are never negative.
pub type Cents = i64;

/// Returns true if `balance` respects a credit limit of `limit`.
/// An account may go negative, but never below `-limit`.
pub fn within_limit(balance: Cents, limit: Cents) -> bool {
    balance >= -limit
}
