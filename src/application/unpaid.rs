use super::runner::TransactionRunner;
use crate::domain::job::Job;
use crate::domain::ports::JobFilter;
use crate::domain::profile::{ProfileId, Role};
use crate::error::Result;

/// Lists work not yet paid, restricted to non-terminated contracts.
pub struct UnpaidWorkQuery {
    runner: TransactionRunner,
}

impl UnpaidWorkQuery {
    pub fn new(runner: TransactionRunner) -> Self {
        Self { runner }
    }

    /// Unpaid jobs on contracts where `profile` is the `role` party.
    pub async fn unpaid_jobs_for(&self, profile: ProfileId, role: Role) -> Result<Vec<Job>> {
        let store = self.runner.store();
        self.runner
            .read(store.find_jobs(JobFilter::unpaid_for(profile, role)))
            .await
    }

    /// Unpaid jobs from both sides: what `profile` owes, then what it is owed.
    pub async fn unpaid_jobs_for_profile(&self, profile: ProfileId) -> Result<Vec<Job>> {
        let mut jobs = self.unpaid_jobs_for(profile, Role::Client).await?;
        jobs.extend(self.unpaid_jobs_for(profile, Role::Contractor).await?);
        Ok(jobs)
    }
}
