use super::profile::ProfileId;
use crate::error::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An inclusive payment-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days, from the first instant of `start` to the last of `end`.
    pub fn from_days(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        let start = start
            .and_hms_opt(0, 0, 0)
            .ok_or(ValidationError::InvalidDateRange)?
            .and_utc();
        let end = end
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or(ValidationError::InvalidDateRange)?
            .and_utc();
        Self::new(start, end)
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ProfessionTotal {
    pub profession: String,
    pub total: Decimal,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ClientTotal {
    pub id: ProfileId,
    pub full_name: String,
    pub paid: Decimal,
}

/// A set-oriented aggregate the store evaluates itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateQuery {
    /// Paid job prices within the window, grouped by contractor profession.
    PaidByProfession { range: DateRange },
    /// Paid job prices within the window, grouped by client, top `limit`.
    PaidByClient { range: DateRange, limit: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateRows {
    Professions(Vec<ProfessionTotal>),
    Clients(Vec<ClientTotal>),
}
