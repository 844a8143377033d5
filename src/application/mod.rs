//! Application layer containing the ledger's business operations.
//!
//! Each component owns one concern (settling jobs, deposits, unpaid-work
//! listings, reports, contract reads) and talks to the store only through a
//! `TransactionRunner`, which bounds every call with a timeout and retries
//! transient transaction failures. `LedgerService` bundles them.

pub mod contracts;
pub mod deposits;
pub mod payments;
pub mod reports;
pub mod runner;
pub mod service;
pub mod unpaid;
