use std::fmt;
use thiserror::Error;

/// The kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Profile,
    Contract,
    Job,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Profile => write!(f, "profile"),
            Entity::Contract => write!(f, "contract"),
            Entity::Job => write!(f, "job"),
        }
    }
}

/// Business-rule violations. Always caused by current ledger state, so
/// retrying without a state change reproduces the same failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Job already paid")]
    AlreadyPaid,
    #[error("Contract is terminated")]
    ContractTerminated,
    #[error("Client does not have enough balance")]
    InsufficientBalance,
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Amount is too high")]
    AmountTooHigh,
    #[error("Start date must be before end date")]
    InvalidDateRange,
    #[error("Limit must be at least 1")]
    InvalidLimit,
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: u32 },
    #[error("profile {profile} is not the client of job {job}")]
    Forbidden { profile: u32, job: u32 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Store unavailable: {0}")]
    TransientStoreFailure(String),
    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

impl LedgerError {
    pub fn not_found(entity: Entity, id: u32) -> Self {
        Self::NotFound { entity, id }
    }

    /// Whether the failure came from infrastructure and is safe to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientStoreFailure(_))
    }

    /// HTTP-like status a routing layer would answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Forbidden { .. } => 403,
            Self::Validation(_) => 400,
            Self::TransientStoreFailure(_) => 503,
            _ => 500,
        }
    }

    /// True for outcomes caused by the request rather than by the system.
    pub fn is_rejection(&self) -> bool {
        self.status() < 500
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(e: rocksdb::Error) -> Self {
        use rocksdb::ErrorKind;
        match e.kind() {
            ErrorKind::Busy | ErrorKind::TimedOut | ErrorKind::TryAgain => {
                Self::TransientStoreFailure(e.into_string())
            }
            _ => Self::StorageError(e.into_string()),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::StorageError(format!("Serialization error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
