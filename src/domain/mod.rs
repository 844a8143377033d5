//! Ledger entities, money value objects and the store port.

pub mod contract;
pub mod job;
pub mod money;
pub mod ports;
pub mod profile;
pub mod report;
