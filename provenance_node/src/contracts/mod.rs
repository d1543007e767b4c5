//! Registry contracts
//!
//! Contracts are plain state machines. Every mutating entry point receives a
//! [`CallContext`] carrying the caller identity and block data, checks
//! authorization first, then existence, then record state, and only writes
//! once every guard has passed. Events go into the context and are kept by
//! the ledger only if the call succeeds.

pub mod authority_center;
pub mod farm;
pub mod tracker;

pub use authority_center::{AuthorityCenter, FarmCertification, FarmProfile};
pub use farm::{Chicken, Egg, Farm, FarmParams};
pub use tracker::{ChickenEggTracker, TrackedChicken, TrackedEgg};

use crate::types::{Address, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Execution context of a single contract call
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Transaction sender
    pub caller: Address,
    /// Address of the contract being called
    pub contract: Address,
    /// Block height
    pub block_number: u64,
    /// Block timestamp
    pub block_timestamp: Timestamp,
    logs: Vec<LogEntry>,
}

impl CallContext {
    pub fn new(
        caller: Address,
        contract: Address,
        block_number: u64,
        block_timestamp: Timestamp,
    ) -> Self {
        Self {
            caller,
            contract,
            block_number,
            block_timestamp,
            logs: Vec::new(),
        }
    }

    /// Record an event emitted by the called contract
    pub fn emit(&mut self, event: Event) {
        self.logs.push(LogEntry {
            address: self.contract,
            block_number: self.block_number,
            event,
        });
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn into_logs(self) -> Vec<LogEntry> {
        self.logs
    }
}

/// Events emitted by the registry contracts, for off-chain indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum Event {
    AuthorityAdded { account: Address },
    AuthorityRemoved { account: Address },
    FarmRegistered { farm: Address },
    FarmRemoved { farm: Address },
    FarmInfoUpdated { name: String, metadata_uri: String },
    ChickenRegistered { chicken_id: u64 },
    ChickenRemoved { chicken_id: u64 },
    ChickenInfoUpdated { chicken_id: u64 },
    EggRegistered { egg_id: u64, chicken_id: u64 },
    EggInfoUpdated { egg_id: u64 },
    TrackedChickenRegistered { chicken_id: String },
    TrackedChickenUpdated { chicken_id: String },
    TrackedChickenRemoved { chicken_id: String },
    TrackedEggRegistered { egg_id: String, chicken_id: String },
    TrackedEggUpdated { egg_id: String },
    TrackedEggRemoved { egg_id: String },
}

/// An event together with the contract that emitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub block_number: u64,
    pub event: Event,
}

/// Read-only view of deployed Farm contracts.
///
/// AuthorityCenter uses it for the chicken-count precondition of
/// `register_farm`, ChickenEggTracker for its farm-owner check. Answers come
/// from another contract and are only ever read, never trusted to mutate.
pub trait FarmLookup {
    /// Owner of the Farm at `farm`, `None` if no Farm lives there
    fn owner_of(&self, farm: &Address) -> Option<Address>;

    /// Chicken count of the Farm at `farm`, `None` if no Farm lives there
    fn chicken_count_of(&self, farm: &Address) -> Option<u64>;
}

impl FarmLookup for HashMap<Address, Farm> {
    fn owner_of(&self, farm: &Address) -> Option<Address> {
        self.get(farm).map(|f| f.owner())
    }

    fn chicken_count_of(&self, farm: &Address) -> Option<u64> {
        self.get(farm).map(|f| f.chicken_count())
    }
}
