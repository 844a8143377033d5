use super::profile::{ProfileId, Role};
use serde::{Deserialize, Serialize};

pub type ContractId = u32;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    New,
    InProgress,
    Terminated,
}

/// The relationship between one client and one contractor. Read-only for
/// the ledger.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Contract {
    pub id: ContractId,
    pub terms: String,
    pub status: ContractStatus,
    pub client_id: ProfileId,
    pub contractor_id: ProfileId,
}

impl Contract {
    pub fn is_terminated(&self) -> bool {
        self.status == ContractStatus::Terminated
    }

    /// Whether `profile` occupies `role` on this contract.
    pub fn has_party(&self, profile: ProfileId, role: Role) -> bool {
        match role {
            Role::Client => self.client_id == profile,
            Role::Contractor => self.contractor_id == profile,
        }
    }

    pub fn involves(&self, profile: ProfileId) -> bool {
        self.client_id == profile || self.contractor_id == profile
    }
}
