use crate::error::{LedgerError, Result, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A profile's funds.
///
/// Wraps `rust_decimal::Decimal` so that balances never pass through floating
/// point and never go below zero. Debits and credits are both checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

/// A strictly positive monetary amount (job price, deposit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> std::result::Result<Self, ValidationError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidAmount)
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> std::result::Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Builds a balance, refusing negative values.
    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO {
            Err(LedgerError::InvariantViolation(format!(
                "negative balance {}",
                value
            )))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn covers(&self, amount: Amount) -> bool {
        self.0 >= amount.0
    }

    /// Adds `amount`. Overflowing `Decimal` means the stored balances are
    /// already corrupt, so it is an invariant violation.
    pub fn credit(self, amount: Amount) -> Result<Self> {
        self.0.checked_add(amount.0).map(Self).ok_or_else(|| {
            LedgerError::InvariantViolation(format!(
                "crediting {} to balance {} overflows",
                amount, self.0
            ))
        })
    }

    /// Removes `amount`, failing instead of going negative.
    pub fn debit(self, amount: Amount) -> std::result::Result<Self, ValidationError> {
        if self.covers(amount) {
            Ok(Self(self.0 - amount.0))
        } else {
            Err(ValidationError::InsufficientBalance)
        }
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
