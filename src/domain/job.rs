use super::contract::ContractId;
use super::money::Amount;
use crate::error::{LedgerError, Result, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = u32;

/// A billable unit under one contract.
///
/// Once `paid` is set the price and payment date are frozen; a job settles
/// at most once.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Job {
    pub id: JobId,
    pub description: String,
    pub price: Amount,
    pub paid: bool,
    pub payment_date: Option<DateTime<Utc>>,
    pub contract_id: ContractId,
}

impl Job {
    /// Checks the paid flag and payment date agree.
    pub fn check_consistency(&self) -> Result<()> {
        match (self.paid, self.payment_date) {
            (true, None) => Err(LedgerError::InvariantViolation(format!(
                "job {} is paid but has no payment date",
                self.id
            ))),
            (false, Some(_)) => Err(LedgerError::InvariantViolation(format!(
                "job {} has a payment date but is not paid",
                self.id
            ))),
            _ => Ok(()),
        }
    }

    /// Marks the job paid at `at`.
    pub fn settle(&mut self, at: DateTime<Utc>) -> std::result::Result<(), ValidationError> {
        if self.paid {
            return Err(ValidationError::AlreadyPaid);
        }
        self.paid = true;
        self.payment_date = Some(at);
        Ok(())
    }
}
