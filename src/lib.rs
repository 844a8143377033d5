//! Payment and balance ledger for client/contractor contracts.
//!
//! Settles jobs by moving their price from client to contractor in one store
//! transaction, gates client self-deposits on outstanding work, lists unpaid
//! jobs and ranks payments by profession and by client.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod telemetry;
