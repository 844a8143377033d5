#![allow(dead_code)]

use contract_ledger::application::service::LedgerService;
use contract_ledger::config::LedgerConfig;
use contract_ledger::domain::contract::{Contract, ContractStatus};
use contract_ledger::domain::job::Job;
use contract_ledger::domain::money::{Amount, Balance};
use contract_ledger::domain::ports::LedgerStore;
use contract_ledger::domain::profile::{Profile, Role};
use contract_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use contract_ledger::interfaces::csv::seed_reader::Dataset;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// A service over an in-memory store loaded with the CSV fixtures.
pub async fn fixture_service() -> (Arc<InMemoryLedgerStore>, LedgerService) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let service = LedgerService::new(store.clone(), &LedgerConfig::default());
    let dataset = Dataset::from_dir(fixtures_dir()).expect("Failed to read fixtures");
    service.load(dataset).await.expect("Failed to load fixtures");
    (store, service)
}

pub async fn total_balance(store: &InMemoryLedgerStore) -> Decimal {
    store
        .all_profiles()
        .await
        .unwrap()
        .iter()
        .map(|p| p.balance.value())
        .sum()
}

pub async fn balance_of(store: &InMemoryLedgerStore, id: u32) -> Decimal {
    store.find_profile(id).await.unwrap().unwrap().balance.value()
}

pub fn profile(id: u32, role: Role, balance: Decimal) -> Profile {
    Profile {
        id,
        first_name: format!("First{}", id),
        last_name: format!("Last{}", id),
        profession: match role {
            Role::Client => "Client".into(),
            Role::Contractor => "Programmer".into(),
        },
        balance: Balance::new(balance).unwrap(),
        role,
    }
}

pub fn contract(id: u32, client_id: u32, contractor_id: u32) -> Contract {
    Contract {
        id,
        terms: "bla bla bla".into(),
        status: ContractStatus::InProgress,
        client_id,
        contractor_id,
    }
}

pub fn unpaid_job(id: u32, contract_id: u32, price: Decimal) -> Job {
    Job {
        id,
        description: "work".into(),
        price: Amount::new(price).unwrap(),
        paid: false,
        payment_date: None,
        contract_id,
    }
}
