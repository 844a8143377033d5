mod common;

use common::{contract, profile, unpaid_job};
use contract_ledger::domain::ports::{JobFilter, LedgerStoreBox};
use contract_ledger::domain::profile::Role;
use contract_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_store_as_trait_object() {
    let store: LedgerStoreBox = Box::new(InMemoryLedgerStore::new());

    // Verify Send + Sync by moving the boxed store into a task
    let handle = tokio::spawn(async move {
        store.insert_profile(profile(1, Role::Client, dec!(10))).await.unwrap();
        store.insert_profile(profile(2, Role::Contractor, dec!(0))).await.unwrap();
        store.insert_contract(contract(1, 1, 2)).await.unwrap();
        store.insert_job(unpaid_job(1, 1, dec!(5))).await.unwrap();
        store.find_jobs(JobFilter::unpaid_for(1, Role::Client)).await.unwrap()
    });

    let jobs = handle.await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].contract_id, 1);
}
