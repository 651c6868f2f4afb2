use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
    Savings,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
            TransactionKind::Savings => "savings",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = TransactionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            "savings" => Ok(TransactionKind::Savings),
            other => Err(TransactionError::InvalidKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionError {
    InvalidKind(String),
    InvalidAmount(f64),
    EmptyOwner,
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::InvalidKind(input) => write!(
                f,
                "unrecognized transaction kind '{input}' (expected income, expense, or savings)"
            ),
            TransactionError::InvalidAmount(amount) => {
                write!(f, "invalid transaction amount {amount}")
            }
            TransactionError::EmptyOwner => write!(f, "transaction owner must not be empty"),
        }
    }
}

impl std::error::Error for TransactionError {}

/// Financial payload attached to a stored rule by its ledger id.
///
/// Amounts are stored as absolute values; the kind carries the direction.
/// The recurrence machinery knows nothing about this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionProfile {
    amount: f64,
    kind: TransactionKind,
    owner: String,
}

impl TransactionProfile {
    pub fn new(
        amount: f64,
        kind: TransactionKind,
        owner: impl Into<String>,
    ) -> Result<Self, TransactionError> {
        if !amount.is_finite() {
            return Err(TransactionError::InvalidAmount(amount));
        }
        let owner = owner.into();
        if owner.trim().is_empty() {
            return Err(TransactionError::EmptyOwner);
        }
        Ok(Self {
            amount: amount.abs(),
            kind,
            owner,
        })
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Re-check the invariants [`new`] enforces, for values that arrived
    /// through deserialization.
    ///
    /// [`new`]: TransactionProfile::new
    pub fn validate(&self) -> Result<(), TransactionError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(TransactionError::InvalidAmount(self.amount));
        }
        if self.owner.trim().is_empty() {
            return Err(TransactionError::EmptyOwner);
        }
        Ok(())
    }
}
