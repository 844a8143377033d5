//! Ledger store backends.

mod aggregate;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
