//! Transaction and receipt types

use crate::common::{ContractKind, Error, ErrorKind};
use crate::contracts::LogEntry;
use crate::types::{keccak256, Address, Hash, Timestamp};
use rlp::RlpStream;
use serde::{Deserialize, Serialize};

/// A call submitted by `from`. The sender identity is taken as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub call: Call,
}

impl Transaction {
    pub fn new(from: Address, call: Call) -> Self {
        Self { from, call }
    }

    /// Hash of `rlp([from, nonce, json(call)])`
    pub fn hash(&self, nonce: u64) -> Hash {
        let payload = serde_json::to_vec(&self.call).unwrap_or_default();
        let mut stream = RlpStream::new_list(3);
        stream.append(&self.from);
        stream.append(&nonce);
        stream.append(&payload);
        keccak256(&stream.out())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Call {
    /// Deploy an AuthorityCenter owned by the sender
    DeployAuthorityCenter,
    DeployFarm {
        owner: Address,
        name: String,
        metadata_uri: String,
        #[serde(default)]
        authority_center: Option<Address>,
    },
    DeployTracker {
        farm: Address,
    },
    AuthorityCenter {
        address: Address,
        call: AuthorityCall,
    },
    Farm {
        address: Address,
        call: FarmCall,
    },
    Tracker {
        address: Address,
        call: TrackerCall,
    },
}

impl Call {
    /// Target contract and its expected kind, `None` for deployments
    pub fn target(&self) -> Option<(Address, ContractKind)> {
        match self {
            Call::DeployAuthorityCenter | Call::DeployFarm { .. } | Call::DeployTracker { .. } => {
                None
            }
            Call::AuthorityCenter { address, .. } => Some((*address, ContractKind::AuthorityCenter)),
            Call::Farm { address, .. } => Some((*address, ContractKind::Farm)),
            Call::Tracker { address, .. } => Some((*address, ContractKind::ChickenEggTracker)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum AuthorityCall {
    AddAuthority {
        account: Address,
    },
    RemoveAuthority {
        account: Address,
    },
    RegisterFarm {
        farm: Address,
        #[serde(default)]
        name: String,
        #[serde(default)]
        location: String,
        #[serde(default)]
        ipfs_hash: String,
    },
    RemoveFarm {
        farm: Address,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FarmCall {
    UpdateInfo { name: String, metadata_uri: String },
    RegisterChicken { metadata_uri: String },
    RemoveChicken { chicken_id: u64 },
    UpdateChickenInfo { chicken_id: u64, metadata_uri: String },
    RegisterEgg { chicken_id: u64, metadata_uri: String },
    UpdateEggInfo { egg_id: u64, metadata_uri: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TrackerCall {
    RegisterChicken {
        chicken_id: String,
        breed: String,
        birth_date: String,
        ipfs_hash: String,
    },
    UpdateChickenInfo {
        chicken_id: String,
        ipfs_hash: String,
    },
    RemoveChicken {
        chicken_id: String,
    },
    RegisterEgg {
        egg_id: String,
        chicken_id: String,
        production_date: String,
        ipfs_hash: String,
    },
    UpdateEggInfo {
        egg_id: String,
        ipfs_hash: String,
    },
    RemoveEgg {
        egg_id: String,
    },
}

/// Transaction status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Reverted,
}

impl TransactionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TransactionStatus::Success)
    }

    pub fn is_reverted(&self) -> bool {
        matches!(self, TransactionStatus::Reverted)
    }
}

/// Value returned by a successful call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutput {
    #[default]
    None,
    ChickenId(u64),
    EggId(u64),
}

impl CallOutput {
    pub fn is_none(&self) -> bool {
        matches!(self, CallOutput::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: Hash,
    pub block_number: u64,
    pub timestamp: Timestamp,
    pub from: Address,
    pub nonce: u64,
    pub status: TransactionStatus,
    /// Address of the contract created by a deployment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    #[serde(default, skip_serializing_if = "CallOutput::is_none")]
    pub output: CallOutput,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl Receipt {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub(crate) fn reverted(
        tx_hash: Hash,
        block_number: u64,
        timestamp: Timestamp,
        from: Address,
        nonce: u64,
        error: &Error,
    ) -> Self {
        Self {
            tx_hash,
            block_number,
            timestamp,
            from,
            nonce,
            status: TransactionStatus::Reverted,
            contract_address: None,
            output: CallOutput::None,
            logs: Vec::new(),
            revert_reason: Some(error.revert_reason()),
            error_kind: Some(error.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn test_call_json_shape() {
        let tx = Transaction::new(
            addr(1),
            Call::Farm {
                address: addr(2),
                call: FarmCall::RegisterEgg {
                    chicken_id: 1,
                    metadata_uri: "ipfs://egg".into(),
                },
            },
        );
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["call"]["type"], "farm");
        assert_eq!(json["call"]["call"]["method"], "register_egg");
        assert_eq!(json["call"]["call"]["chicken_id"], 1);

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn test_register_farm_profile_fields_optional() {
        let json = serde_json::json!({
            "method": "register_farm",
            "farm": "0x0000000000000000000000000000000000000005",
        });
        let call: AuthorityCall = serde_json::from_value(json).unwrap();
        assert_eq!(
            call,
            AuthorityCall::RegisterFarm {
                farm: addr(5),
                name: String::new(),
                location: String::new(),
                ipfs_hash: String::new(),
            }
        );
    }

    #[test]
    fn test_hash_depends_on_nonce() {
        let tx = Transaction::new(addr(1), Call::DeployAuthorityCenter);
        assert_ne!(tx.hash(0), tx.hash(1));
        assert_eq!(tx.hash(3), tx.hash(3));
    }

    #[test]
    fn test_reverted_receipt_carries_reason() {
        let receipt = Receipt::reverted(Hash::zero(), 1, 100, addr(1), 0, &Error::NotOwner);
        assert!(receipt.status.is_reverted());
        assert_eq!(receipt.error_kind, Some(ErrorKind::Unauthorized));
        assert_eq!(
            receipt.revert_reason.as_deref(),
            Some("Only owner can call this function")
        );

        let json = serde_json::to_value(&receipt).unwrap();
        assert!(json.get("contract_address").is_none());
        assert!(json.get("output").is_none());
    }

    #[test]
    fn test_target_of_calls() {
        assert_eq!(Call::DeployAuthorityCenter.target(), None);
        let call = Call::Tracker {
            address: addr(9),
            call: TrackerCall::RemoveEgg { egg_id: "E1".into() },
        };
        assert_eq!(call.target(), Some((addr(9), ContractKind::ChickenEggTracker)));
    }
}
