use super::aggregate;
use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::{Job, JobId};
use crate::domain::ports::{ContractFilter, JobFilter, LedgerStore, LedgerTransaction, UnitOfWork};
use crate::domain::profile::{Profile, ProfileId, Role};
use crate::domain::report::{AggregateQuery, AggregateRows};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct LedgerState {
    profiles: BTreeMap<ProfileId, Profile>,
    contracts: BTreeMap<ContractId, Contract>,
    jobs: BTreeMap<JobId, Job>,
}

impl LedgerState {
    fn matching_jobs(&self, filter: JobFilter) -> Vec<Job> {
        self.jobs
            .values()
            .filter(|job| {
                self.contracts
                    .get(&job.contract_id)
                    .is_some_and(|c| filter.matches(job, c))
            })
            .cloned()
            .collect()
    }
}

/// A thread-safe in-memory ledger.
///
/// Uses `Arc<RwLock<LedgerState>>`. A unit of work holds the write lock for
/// its whole duration, so transactions are fully serialized; reads share the
/// read lock and always see committed state.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Writes staged by a unit of work, applied only on commit.
struct InMemoryTransaction<'a> {
    state: &'a LedgerState,
    jobs: BTreeMap<JobId, Job>,
    profiles: BTreeMap<ProfileId, Profile>,
}

impl<'a> InMemoryTransaction<'a> {
    fn new(state: &'a LedgerState) -> Self {
        Self {
            state,
            jobs: BTreeMap::new(),
            profiles: BTreeMap::new(),
        }
    }

    fn into_staged(self) -> (BTreeMap<JobId, Job>, BTreeMap<ProfileId, Profile>) {
        (self.jobs, self.profiles)
    }
}

impl LedgerTransaction for InMemoryTransaction<'_> {
    fn job_for_update(&mut self, id: JobId) -> Result<Option<Job>> {
        Ok(self.jobs.get(&id).or_else(|| self.state.jobs.get(&id)).cloned())
    }

    fn contract(&mut self, id: ContractId) -> Result<Option<Contract>> {
        Ok(self.state.contracts.get(&id).cloned())
    }

    fn profile_for_update(&mut self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self
            .profiles
            .get(&id)
            .or_else(|| self.state.profiles.get(&id))
            .cloned())
    }

    fn unpaid_jobs(&mut self, profile: ProfileId, role: Role) -> Result<Vec<Job>> {
        let filter = JobFilter::unpaid_for(profile, role);
        Ok(self
            .state
            .jobs
            .iter()
            .map(|(id, job)| self.jobs.get(id).unwrap_or(job))
            .filter(|job| {
                self.state
                    .contracts
                    .get(&job.contract_id)
                    .is_some_and(|c| filter.matches(job, c))
            })
            .cloned()
            .collect())
    }

    fn put_job(&mut self, job: &Job) -> Result<()> {
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    fn put_profile(&mut self, profile: &Profile) -> Result<()> {
        self.profiles.insert(profile.id, profile.clone());
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn execute_in_transaction(&self, work: &mut UnitOfWork<'_>) -> Result<()> {
        let mut state = self.state.write().await;
        let (jobs, profiles) = {
            let mut tx = InMemoryTransaction::new(&state);
            // Dropping the staged writes is the rollback.
            work(&mut tx)?;
            tx.into_staged()
        };
        state.jobs.extend(jobs);
        state.profiles.extend(profiles);
        Ok(())
    }

    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>> {
        Ok(self.state.read().await.profiles.get(&id).cloned())
    }

    async fn find_contract(&self, id: ContractId) -> Result<Option<Contract>> {
        Ok(self.state.read().await.contracts.get(&id).cloned())
    }

    async fn find_job(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.state.read().await.jobs.get(&id).cloned())
    }

    async fn find_jobs(&self, filter: JobFilter) -> Result<Vec<Job>> {
        Ok(self.state.read().await.matching_jobs(filter))
    }

    async fn find_contracts(&self, filter: ContractFilter) -> Result<Vec<Contract>> {
        let state = self.state.read().await;
        Ok(state
            .contracts
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn all_profiles(&self) -> Result<Vec<Profile>> {
        Ok(self.state.read().await.profiles.values().cloned().collect())
    }

    async fn execute_aggregate(&self, query: AggregateQuery) -> Result<AggregateRows> {
        let state = self.state.read().await;
        aggregate::evaluate(
            query,
            state.jobs.values().cloned().map(Ok),
            |id| Ok(state.contracts.get(&id).cloned()),
            |id| Ok(state.profiles.get(&id).cloned()),
        )
    }

    async fn insert_profile(&self, profile: Profile) -> Result<()> {
        self.state.write().await.profiles.insert(profile.id, profile);
        Ok(())
    }

    async fn insert_contract(&self, contract: Contract) -> Result<()> {
        self.state
            .write()
            .await
            .contracts
            .insert(contract.id, contract);
        Ok(())
    }

    async fn insert_job(&self, job: Job) -> Result<()> {
        self.state.write().await.jobs.insert(job.id, job);
        Ok(())
    }
}
