use crate::config::StoreConfig;
use crate::domain::ports::{LedgerStore, LedgerStoreRef, UnitOfWork};
use crate::error::{LedgerError, Result};
use std::future::Future;
use tracing::{error, warn};

/// Runs store calls with a bounded timeout, retrying units of work that fail
/// transiently.
///
/// Business-rule failures are never retried: they come from ledger state and
/// would fail the same way again.
#[derive(Clone)]
pub struct TransactionRunner {
    store: LedgerStoreRef,
    config: StoreConfig,
}

impl TransactionRunner {
    pub fn new(store: LedgerStoreRef, config: StoreConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }

    fn timed_out(&self) -> LedgerError {
        LedgerError::TransientStoreFailure(format!(
            "store did not answer within {}ms",
            self.config.timeout_ms
        ))
    }

    /// Executes `work` in a store transaction, at most `max_attempts` times.
    pub async fn run(&self, work: &mut UnitOfWork<'_>) -> Result<()> {
        let mut attempt = 1;
        loop {
            let outcome = tokio::time::timeout(
                self.config.timeout(),
                self.store.execute_in_transaction(&mut *work),
            )
            .await
            .unwrap_or_else(|_| Err(self.timed_out()));

            match outcome {
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    warn!(attempt, error = %e, "transaction failed, retrying");
                    tokio::time::sleep(self.config.retry_backoff() * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(report(e)),
                Ok(()) => return Ok(()),
            }
        }
    }

    /// Awaits a read-only store call under the same timeout.
    pub async fn read<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.timeout(), call).await {
            Ok(result) => result.map_err(report),
            Err(_) => Err(self.timed_out()),
        }
    }
}

fn report(e: LedgerError) -> LedgerError {
    if let LedgerError::InvariantViolation(detail) = &e {
        error!(%detail, "ledger invariant violated, operation aborted");
    }
    e
}
