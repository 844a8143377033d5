//! Adapters that move ledger data in and out of the process.

pub mod csv;
