use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

pub type TransactionId = i64;

/// Longest description accepted, counted in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Increases the balance
    #[serde(rename = "c")]
    Credit,
    /// Decreases the balance
    #[serde(rename = "d")]
    Debit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Credit => "c",
            Direction::Debit => "d",
        }
    }

    /// Parse the wire tag. Only the exact tags `c` and `d` are accepted.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "c" => Some(Direction::Credit),
            "d" => Some(Direction::Debit),
            _ => None,
        }
    }

    /// The signed balance change for a transaction of `value`.
    pub fn signed(&self, value: Cents) -> Cents {
        match self {
            Direction::Credit => value,
            Direction::Debit => -value,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated transaction that has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub value: Cents,
    pub direction: Direction,
    pub description: String,
}

impl NewTransaction {
    pub fn new(
        value: Cents,
        direction: Direction,
        description: impl Into<String>,
    ) -> Result<Self, TransactionError> {
        if value <= 0 {
            return Err(TransactionError::NonPositiveValue(value));
        }

        let description = description.into();
        let len = description.chars().count();
        if len == 0 || len > MAX_DESCRIPTION_CHARS {
            return Err(TransactionError::DescriptionLength(len));
        }

        Ok(Self {
            value,
            direction,
            description,
        })
    }

    pub fn credit(value: Cents, description: impl Into<String>) -> Result<Self, TransactionError> {
        Self::new(value, Direction::Credit, description)
    }

    pub fn debit(value: Cents, description: impl Into<String>) -> Result<Self, TransactionError> {
        Self::new(value, Direction::Debit, description)
    }

    /// Signed change this transaction applies to the balance.
    pub fn delta(&self) -> Cents {
        self.direction.signed(self.value)
    }
}

/// A transaction as recorded by the store. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    /// Magnitude in cents (always positive)
    pub value: Cents,
    pub direction: Direction,
    pub description: String,
    /// Assigned by the store at insertion time
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    NonPositiveValue(Cents),
    UnknownDirection(String),
    DescriptionLength(usize),
}

impl std::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionError::NonPositiveValue(value) => {
                write!(f, "value must be positive, got {}", value)
            }
            TransactionError::UnknownDirection(tag) => {
                write!(f, "unknown transaction type '{}', expected 'c' or 'd'", tag)
            }
            TransactionError::DescriptionLength(len) => write!(
                f,
                "description must have 1 to {} characters, got {}",
                MAX_DESCRIPTION_CHARS, len
            ),
        }
    }
}

impl std::error::Error for TransactionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_tags() {
        assert_eq!(Direction::from_str("c"), Some(Direction::Credit));
        assert_eq!(Direction::from_str("d"), Some(Direction::Debit));
        assert_eq!(Direction::from_str("C"), None);
        assert_eq!(Direction::from_str("credit"), None);
        assert_eq!(Direction::from_str(""), None);
        assert_eq!(Direction::Debit.to_string(), "d");
    }

    #[test]
    fn test_delta_sign_follows_direction() {
        let credit = NewTransaction::credit(100, "deposit").unwrap();
        let debit = NewTransaction::debit(100, "rent").unwrap();
        assert_eq!(credit.delta(), 100);
        assert_eq!(debit.delta(), -100);
    }

    #[test]
    fn test_rejects_non_positive_value() {
        assert_eq!(
            NewTransaction::debit(0, "x"),
            Err(TransactionError::NonPositiveValue(0))
        );
        assert_eq!(
            NewTransaction::credit(-5, "x"),
            Err(TransactionError::NonPositiveValue(-5))
        );
    }

    #[test]
    fn test_description_bounds_count_characters() {
        assert!(NewTransaction::credit(1, "").is_err());
        assert!(NewTransaction::credit(1, "a").is_ok());
        assert!(NewTransaction::credit(1, "0123456789").is_ok());
        assert_eq!(
            NewTransaction::credit(1, "0123456789a"),
            Err(TransactionError::DescriptionLength(11))
        );
        // Ten characters, more than ten bytes
        assert!(NewTransaction::credit(1, "pão de açú").is_ok());
    }

    #[test]
    fn test_direction_serializes_as_wire_tag() {
        assert_eq!(serde_json::to_string(&Direction::Credit).unwrap(), "\"c\"");
        assert_eq!(
            serde_json::from_str::<Direction>("\"d\"").unwrap(),
            Direction::Debit
        );
    }
}
