use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Tunable ledger policy and store behaviour, loaded from TOML.
///
/// Every section and field is optional; missing values take the defaults
/// below.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    pub deposit: DepositConfig,
    pub reports: ReportsConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DepositConfig {
    /// Share of outstanding unpaid work a client may deposit at once.
    pub cap_ratio: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportsConfig {
    /// Return only the best-earning profession instead of the full ranking.
    pub profession_top_only: bool,
    pub client_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Row-lock wait limit inside a RocksDB transaction. A unit of work runs
    /// synchronously, so this is what bounds a blocked transaction and it has
    /// to stay below `timeout_ms`.
    pub lock_timeout_ms: u64,
}

impl Default for DepositConfig {
    fn default() -> Self {
        Self {
            cap_ratio: dec!(0.25),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            profession_top_only: true,
            client_limit: 2,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            max_attempts: 3,
            retry_backoff_ms: 20,
            lock_timeout_ms: 1000,
        }
    }
}

impl StoreConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl LedgerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| LedgerError::ConfigError(format!("invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            LedgerError::ConfigError(format!(
                "cannot read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let ratio = self.deposit.cap_ratio;
        if ratio < Decimal::ZERO || ratio > Decimal::ONE {
            return Err(LedgerError::ConfigError(format!(
                "deposit.cap_ratio must be within [0, 1], got {}",
                ratio
            )));
        }
        if self.reports.client_limit == 0 {
            return Err(LedgerError::ConfigError(
                "reports.client_limit must be at least 1".into(),
            ));
        }
        if self.store.timeout_ms == 0 || self.store.max_attempts == 0 {
            return Err(LedgerError::ConfigError(
                "store.timeout_ms and store.max_attempts must be positive".into(),
            ));
        }
        if self.store.lock_timeout_ms >= self.store.timeout_ms {
            return Err(LedgerError::ConfigError(format!(
                "store.lock_timeout_ms ({}) must be below store.timeout_ms ({})",
                self.store.lock_timeout_ms, self.store.timeout_ms
            )));
        }
        Ok(())
    }
}
