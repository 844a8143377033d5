use super::runner::TransactionRunner;
use crate::config::ReportsConfig;
use crate::domain::report::{AggregateQuery, AggregateRows, ClientTotal, DateRange, ProfessionTotal};
use crate::error::{LedgerError, Result};

/// Ranked payment summaries over a payment-date window.
///
/// Grouping runs inside the store as a single aggregate query; rows are never
/// fetched and joined here.
pub struct AggregationReporter {
    runner: TransactionRunner,
    config: ReportsConfig,
}

impl AggregationReporter {
    pub fn new(runner: TransactionRunner, config: ReportsConfig) -> Self {
        Self { runner, config }
    }

    async fn aggregate(&self, query: AggregateQuery) -> Result<AggregateRows> {
        let store = self.runner.store();
        self.runner.read(store.execute_aggregate(query)).await
    }

    /// Total paid per contractor profession, highest first.
    pub async fn payments_by_profession(&self, range: DateRange) -> Result<Vec<ProfessionTotal>> {
        if range.is_inverted() {
            return Ok(Vec::new());
        }
        match self
            .aggregate(AggregateQuery::PaidByProfession { range })
            .await?
        {
            AggregateRows::Professions(rows) => Ok(rows),
            AggregateRows::Clients(_) => Err(mismatched_rows()),
        }
    }

    /// Top clients by total paid; `limit` defaults to the configured value.
    pub async fn payments_by_client(
        &self,
        range: DateRange,
        limit: Option<usize>,
    ) -> Result<Vec<ClientTotal>> {
        let limit = limit.unwrap_or(self.config.client_limit);
        if range.is_inverted() || limit == 0 {
            return Ok(Vec::new());
        }
        match self
            .aggregate(AggregateQuery::PaidByClient { range, limit })
            .await?
        {
            AggregateRows::Clients(rows) => Ok(rows),
            AggregateRows::Professions(_) => Err(mismatched_rows()),
        }
    }

    /// The best-earning profession, or the full ranking when
    /// `profession_top_only` is off. Empty means no payments in the window.
    pub async fn best_profession(&self, range: DateRange) -> Result<Vec<ProfessionTotal>> {
        let mut rows = self.payments_by_profession(range).await?;
        if self.config.profession_top_only {
            rows.truncate(1);
        }
        Ok(rows)
    }
}

fn mismatched_rows() -> LedgerError {
    LedgerError::InvariantViolation("store answered an aggregate with the wrong row shape".into())
}
