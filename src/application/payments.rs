use super::runner::TransactionRunner;
use crate::domain::job::{Job, JobId};
use crate::domain::ports::LedgerTransaction;
use crate::domain::profile::{Profile, ProfileId};
use crate::error::{Entity, LedgerError, Result, ValidationError};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Settles jobs by moving their price from the contract's client to its
/// contractor.
///
/// All reads happen inside the settling transaction, so the balance checked is
/// the balance debited.
pub struct PaymentEngine {
    runner: TransactionRunner,
}

impl PaymentEngine {
    pub fn new(runner: TransactionRunner) -> Self {
        Self { runner }
    }

    /// Pays `job_id` on behalf of `client_id`.
    ///
    /// Preconditions are checked in order: the job exists, the caller is the
    /// contract's client, the job is unpaid, the contract is not terminated and
    /// the client can cover the price. Paying twice is an error, not a no-op.
    pub async fn pay_job(&self, job_id: JobId, client_id: ProfileId) -> Result<Job> {
        let mut settled = None;
        let outcome = self
            .runner
            .run(&mut |tx: &mut dyn LedgerTransaction| {
                settled = Some(settle(tx, job_id, client_id, Utc::now())?);
                Ok(())
            })
            .await;

        if let Err(e) = outcome {
            debug!(job = job_id, client = client_id, error = %e, "payment rejected");
            return Err(e);
        }
        let job = settled.ok_or_else(|| {
            LedgerError::InvariantViolation(format!("settlement of job {} left no result", job_id))
        })?;
        info!(job = job.id, client = client_id, price = %job.price, "job paid");
        Ok(job)
    }
}

fn settle(
    tx: &mut dyn LedgerTransaction,
    job_id: JobId,
    client_id: ProfileId,
    now: DateTime<Utc>,
) -> Result<Job> {
    let mut job = tx
        .job_for_update(job_id)?
        .ok_or_else(|| LedgerError::not_found(Entity::Job, job_id))?;
    job.check_consistency()?;

    let contract = tx.contract(job.contract_id)?.ok_or_else(|| {
        LedgerError::InvariantViolation(format!(
            "job {} references missing contract {}",
            job.id, job.contract_id
        ))
    })?;
    if contract.client_id != client_id {
        return Err(LedgerError::Forbidden {
            profile: client_id,
            job: job_id,
        });
    }
    if job.paid {
        return Err(ValidationError::AlreadyPaid.into());
    }
    if contract.is_terminated() {
        return Err(ValidationError::ContractTerminated.into());
    }
    if contract.client_id == contract.contractor_id {
        return Err(LedgerError::InvariantViolation(format!(
            "contract {} has the same client and contractor",
            contract.id
        )));
    }

    // Lock both profiles in id order so opposing payments cannot deadlock.
    let (first, second) = if contract.client_id < contract.contractor_id {
        (contract.client_id, contract.contractor_id)
    } else {
        (contract.contractor_id, contract.client_id)
    };
    let mut first = lock_party(tx, first, contract.id)?;
    let mut second = lock_party(tx, second, contract.id)?;
    let (client, contractor) = if first.id == contract.client_id {
        (&mut first, &mut second)
    } else {
        (&mut second, &mut first)
    };

    client.balance = client.balance.debit(job.price)?;
    contractor.balance = contractor.balance.credit(job.price)?;
    job.settle(now)?;

    tx.put_job(&job)?;
    tx.put_profile(client)?;
    tx.put_profile(contractor)?;
    Ok(job)
}

fn lock_party(
    tx: &mut dyn LedgerTransaction,
    id: ProfileId,
    contract: u32,
) -> Result<Profile> {
    tx.profile_for_update(id)?.ok_or_else(|| {
        LedgerError::InvariantViolation(format!(
            "contract {} references missing profile {}",
            contract, id
        ))
    })
}
