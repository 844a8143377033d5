use super::runner::TransactionRunner;
use crate::domain::job::Job;
use crate::domain::money::Amount;
use crate::domain::ports::LedgerTransaction;
use crate::domain::profile::{Profile, ProfileId, Role};
use crate::error::{Entity, LedgerError, Result, ValidationError};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Sum of prices of a client's outstanding jobs.
pub fn debt_exposure(unpaid: &[Job]) -> Result<Decimal> {
    unpaid.iter().try_fold(Decimal::ZERO, |total, job| {
        total.checked_add(job.price.value()).ok_or_else(|| {
            LedgerError::InvariantViolation(format!(
                "unpaid total overflows at job {}",
                job.id
            ))
        })
    })
}

/// Lets clients fund their own balance, up to a share of what they still owe.
pub struct DepositPolicy {
    runner: TransactionRunner,
    cap_ratio: Decimal,
}

impl DepositPolicy {
    pub fn new(runner: TransactionRunner, cap_ratio: Decimal) -> Self {
        Self { runner, cap_ratio }
    }

    /// Credits `amount` to `profile_id`.
    ///
    /// The profile row is locked before the unpaid total is read and stays
    /// locked until the credit commits, so deposits for one client are
    /// serialized and each is checked against committed state.
    pub async fn deposit(&self, profile_id: ProfileId, amount: Decimal) -> Result<Profile> {
        let amount = Amount::new(amount)?;
        let cap_ratio = self.cap_ratio;

        let mut updated = None;
        let outcome = self
            .runner
            .run(&mut |tx: &mut dyn LedgerTransaction| {
                let mut profile = tx
                    .profile_for_update(profile_id)?
                    .ok_or_else(|| LedgerError::not_found(Entity::Profile, profile_id))?;

                let to_be_paid = debt_exposure(&tx.unpaid_jobs(profile_id, Role::Client)?)?;
                if amount.value() > to_be_paid * cap_ratio {
                    return Err(ValidationError::AmountTooHigh.into());
                }

                profile.balance = profile.balance.credit(amount)?;
                tx.put_profile(&profile)?;
                updated = Some(profile);
                Ok(())
            })
            .await;

        if let Err(e) = outcome {
            debug!(profile = profile_id, %amount, error = %e, "deposit rejected");
            return Err(e);
        }
        let profile = updated.ok_or_else(|| {
            LedgerError::InvariantViolation(format!(
                "deposit for profile {} left no result",
                profile_id
            ))
        })?;
        info!(profile = profile_id, %amount, balance = %profile.balance, "deposit applied");
        Ok(profile)
    }
}
