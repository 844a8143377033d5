use super::contract::{Contract, ContractId};
use super::job::{Job, JobId};
use super::profile::{Profile, ProfileId, Role};
use super::report::{AggregateQuery, AggregateRows};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Which jobs `find_jobs` returns. Conditions are joined through the job's
/// contract by the store.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JobFilter {
    pub unpaid_only: bool,
    pub party: Option<(ProfileId, Role)>,
    pub exclude_terminated: bool,
}

impl JobFilter {
    /// Unpaid jobs on non-terminated contracts where `profile` holds `role`.
    pub fn unpaid_for(profile: ProfileId, role: Role) -> Self {
        Self {
            unpaid_only: true,
            party: Some((profile, role)),
            exclude_terminated: true,
        }
    }

    pub fn matches(&self, job: &Job, contract: &Contract) -> bool {
        if self.unpaid_only && job.paid {
            return false;
        }
        if self.exclude_terminated && contract.is_terminated() {
            return false;
        }
        match self.party {
            Some((profile, role)) => contract.has_party(profile, role),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContractFilter {
    pub party: Option<ProfileId>,
    pub exclude_terminated: bool,
}

impl ContractFilter {
    pub fn matches(&self, contract: &Contract) -> bool {
        if self.exclude_terminated && contract.is_terminated() {
            return false;
        }
        self.party.is_none_or(|p| contract.involves(p))
    }
}

/// Handle given to a unit of work. Reads marked `for_update` hold their row
/// until the transaction ends; writes become visible only on commit.
pub trait LedgerTransaction {
    fn job_for_update(&mut self, id: JobId) -> Result<Option<Job>>;
    fn contract(&mut self, id: ContractId) -> Result<Option<Contract>>;
    fn profile_for_update(&mut self, id: ProfileId) -> Result<Option<Profile>>;
    fn unpaid_jobs(&mut self, profile: ProfileId, role: Role) -> Result<Vec<Job>>;
    fn put_job(&mut self, job: &Job) -> Result<()>;
    fn put_profile(&mut self, profile: &Profile) -> Result<()>;
}

/// A unit of work. Returning `Err` rolls the transaction back. May run more
/// than once when a transient failure is retried.
pub type UnitOfWork<'a> = dyn FnMut(&mut dyn LedgerTransaction) -> Result<()> + Send + 'a;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Begins a transaction, runs `work` in it and commits or rolls back.
    async fn execute_in_transaction(&self, work: &mut UnitOfWork<'_>) -> Result<()>;

    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>>;
    async fn find_contract(&self, id: ContractId) -> Result<Option<Contract>>;
    async fn find_job(&self, id: JobId) -> Result<Option<Job>>;
    async fn find_jobs(&self, filter: JobFilter) -> Result<Vec<Job>>;
    async fn find_contracts(&self, filter: ContractFilter) -> Result<Vec<Contract>>;
    async fn all_profiles(&self) -> Result<Vec<Profile>>;

    /// Evaluates a grouping query inside the store.
    async fn execute_aggregate(&self, query: AggregateQuery) -> Result<AggregateRows>;

    async fn insert_profile(&self, profile: Profile) -> Result<()>;
    async fn insert_contract(&self, contract: Contract) -> Result<()>;
    async fn insert_job(&self, job: Job) -> Result<()>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type LedgerStoreRef = Arc<dyn LedgerStore>;
