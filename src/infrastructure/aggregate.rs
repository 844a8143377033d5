use crate::domain::contract::{Contract, ContractId};
use crate::domain::job::Job;
use crate::domain::profile::{Profile, ProfileId};
use crate::domain::report::{AggregateQuery, AggregateRows, ClientTotal, ProfessionTotal};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Evaluates an aggregate over one consistent view of the store.
///
/// Each paid job joins to exactly one contract and one profile, so grouping
/// here never double counts. Jobs whose contract or profile is missing drop
/// out, as with an inner join.
fn accumulate(total: Decimal, value: Decimal) -> Result<Decimal> {
    total
        .checked_add(value)
        .ok_or_else(|| LedgerError::InvariantViolation("payment total overflows".into()))
}

pub(crate) fn evaluate<J, C, P>(
    query: AggregateQuery,
    jobs: J,
    mut contract_of: C,
    mut profile_of: P,
) -> Result<AggregateRows>
where
    J: IntoIterator<Item = Result<Job>>,
    C: FnMut(ContractId) -> Result<Option<Contract>>,
    P: FnMut(ProfileId) -> Result<Option<Profile>>,
{
    let (range, by_client, limit) = match query {
        AggregateQuery::PaidByProfession { range } => (range, false, usize::MAX),
        AggregateQuery::PaidByClient { range, limit } => (range, true, limit),
    };

    let mut contracts: HashMap<ContractId, Option<Contract>> = HashMap::new();
    let mut profiles: HashMap<ProfileId, Option<Profile>> = HashMap::new();
    let mut groups: HashMap<ProfileId, Decimal> = HashMap::new();

    if !range.is_inverted() && limit > 0 {
        for job in jobs {
            let job = job?;
            let Some(paid_at) = job.payment_date else {
                continue;
            };
            if !range.contains(paid_at) {
                continue;
            }
            if !contracts.contains_key(&job.contract_id) {
                contracts.insert(job.contract_id, contract_of(job.contract_id)?);
            }
            let Some(contract) = &contracts[&job.contract_id] else {
                continue;
            };
            let party = if by_client {
                contract.client_id
            } else {
                contract.contractor_id
            };
            let total = groups.entry(party).or_insert(Decimal::ZERO);
            *total = accumulate(*total, job.price.value())?;
        }
    }

    for id in groups.keys() {
        if !profiles.contains_key(id) {
            profiles.insert(*id, profile_of(*id)?);
        }
    }

    if by_client {
        let mut rows: Vec<ClientTotal> = groups
            .into_iter()
            .filter_map(|(id, paid)| {
                profiles[&id].as_ref().map(|p| ClientTotal {
                    id,
                    full_name: p.full_name(),
                    paid,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.paid.cmp(&a.paid).then(a.id.cmp(&b.id)));
        rows.truncate(limit);
        Ok(AggregateRows::Clients(rows))
    } else {
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for (id, total) in groups {
            if let Some(p) = &profiles[&id] {
                let sum = totals.entry(p.profession.clone()).or_insert(Decimal::ZERO);
                *sum = accumulate(*sum, total)?;
            }
        }
        let mut rows: Vec<ProfessionTotal> = totals
            .into_iter()
            .map(|(profession, total)| ProfessionTotal { profession, total })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total).then(a.profession.cmp(&b.profession)));
        Ok(AggregateRows::Professions(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::contract::ContractStatus;
    use crate::domain::money::{Amount, Balance};
    use crate::domain::profile::Role;
    use crate::domain::report::DateRange;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_overflowing_totals_are_reported() {
        let paid_at = Utc.with_ymd_and_hms(2020, 8, 15, 12, 0, 0).unwrap();
        let job = |id: u32| -> Result<Job> {
            Ok(Job {
                id,
                description: "work".into(),
                price: Amount::new(Decimal::MAX).unwrap(),
                paid: true,
                payment_date: Some(paid_at),
                contract_id: 1,
            })
        };
        let contract = Contract {
            id: 1,
            terms: "terms".into(),
            status: ContractStatus::InProgress,
            client_id: 1,
            contractor_id: 2,
        };
        let profile = Profile {
            id: 1,
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            profession: "Buyer".into(),
            balance: Balance::ZERO,
            role: Role::Client,
        };
        let range = DateRange::new(paid_at, paid_at).unwrap();

        let result = evaluate(
            AggregateQuery::PaidByClient { range, limit: 2 },
            [job(1), job(2)],
            |_| Ok(Some(contract.clone())),
            |_| Ok(Some(profile.clone())),
        );

        assert!(matches!(result, Err(LedgerError::InvariantViolation(_))));
    }
}
