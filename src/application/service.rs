use super::contracts::ContractQuery;
use super::deposits::DepositPolicy;
use super::payments::PaymentEngine;
use super::reports::AggregationReporter;
use super::runner::TransactionRunner;
use super::unpaid::UnpaidWorkQuery;
use crate::config::LedgerConfig;
use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::profile::{Profile, ProfileId};
use crate::domain::report::{ClientTotal, DateRange, ProfessionTotal};
use crate::error::{Entity, LedgerError, Result};
use crate::interfaces::csv::seed_reader::Dataset;
use rust_decimal::Decimal;
use tracing::info;

/// The ledger's in-process service boundary.
///
/// Bundles the payment, deposit, query and reporting components over one
/// shared store. Callers supply an already-resolved caller profile id and
/// typed parameters; outcomes come back as `Result` with a typed
/// `LedgerError`.
pub struct LedgerService {
    runner: TransactionRunner,
    payments: PaymentEngine,
    deposits: DepositPolicy,
    unpaid: UnpaidWorkQuery,
    reports: AggregationReporter,
    contracts: ContractQuery,
}

impl LedgerService {
    pub fn new(store: LedgerStoreRef, config: &LedgerConfig) -> Self {
        let runner = TransactionRunner::new(store, config.store.clone());
        Self {
            payments: PaymentEngine::new(runner.clone()),
            deposits: DepositPolicy::new(runner.clone(), config.deposit.cap_ratio),
            unpaid: UnpaidWorkQuery::new(runner.clone()),
            reports: AggregationReporter::new(runner.clone(), config.reports.clone()),
            contracts: ContractQuery::new(runner.clone()),
            runner,
        }
    }

    /// Loads a dataset into the store, replacing records with the same ids.
    pub async fn load(&self, dataset: Dataset) -> Result<()> {
        let store = self.runner.store();
        let (profiles, contracts, jobs) =
            (dataset.profiles.len(), dataset.contracts.len(), dataset.jobs.len());
        for profile in dataset.profiles {
            store.insert_profile(profile).await?;
        }
        for contract in dataset.contracts {
            store.insert_contract(contract).await?;
        }
        for job in dataset.jobs {
            store.insert_job(job).await?;
        }
        info!(profiles, contracts, jobs, "dataset loaded");
        Ok(())
    }

    /// Resolves a caller's profile.
    pub async fn profile(&self, id: ProfileId) -> Result<Profile> {
        let store = self.runner.store();
        self.runner
            .read(store.find_profile(id))
            .await?
            .ok_or_else(|| LedgerError::not_found(Entity::Profile, id))
    }

    pub async fn balances(&self) -> Result<Vec<Profile>> {
        let store = self.runner.store();
        self.runner.read(store.all_profiles()).await
    }

    pub async fn pay_job(&self, job: JobId, client: ProfileId) -> Result<Job> {
        self.payments.pay_job(job, client).await
    }

    pub async fn deposit(&self, profile: ProfileId, amount: Decimal) -> Result<Profile> {
        self.deposits.deposit(profile, amount).await
    }

    pub async fn unpaid_jobs(&self, profile: ProfileId) -> Result<Vec<Job>> {
        self.unpaid.unpaid_jobs_for_profile(profile).await
    }

    pub async fn contract(&self, profile: ProfileId, id: ContractId) -> Result<Contract> {
        self.contracts.contract_for(profile, id).await
    }

    pub async fn contracts(&self, profile: ProfileId) -> Result<Vec<Contract>> {
        self.contracts.active_contracts_for(profile).await
    }

    pub async fn best_profession(&self, range: DateRange) -> Result<Vec<ProfessionTotal>> {
        self.reports.best_profession(range).await
    }

    pub async fn best_clients(
        &self,
        range: DateRange,
        limit: Option<usize>,
    ) -> Result<Vec<ClientTotal>> {
        self.reports.payments_by_client(range, limit).await
    }
}
