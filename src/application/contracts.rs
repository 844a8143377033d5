use super::runner::TransactionRunner;
use crate::domain::contract::{Contract, ContractId};
use crate::domain::ports::ContractFilter;
use crate::domain::profile::ProfileId;
use crate::error::{Entity, LedgerError, Result};

/// Contract reads scoped to the parties of each contract.
pub struct ContractQuery {
    runner: TransactionRunner,
}

impl ContractQuery {
    pub fn new(runner: TransactionRunner) -> Self {
        Self { runner }
    }

    /// A contract `profile` is party to. Contracts of other parties are
    /// reported as not found.
    pub async fn contract_for(&self, profile: ProfileId, id: ContractId) -> Result<Contract> {
        let store = self.runner.store();
        self.runner
            .read(store.find_contract(id))
            .await?
            .filter(|c| c.involves(profile))
            .ok_or_else(|| LedgerError::not_found(Entity::Contract, id))
    }

    /// Non-terminated contracts `profile` is party to.
    pub async fn active_contracts_for(&self, profile: ProfileId) -> Result<Vec<Contract>> {
        let store = self.runner.store();
        let filter = ContractFilter {
            party: Some(profile),
            exclude_terminated: true,
        };
        self.runner.read(store.find_contracts(filter)).await
    }
}
