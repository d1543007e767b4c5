//! Serial execution engine for the registry contracts.
//!
//! Every transaction is mined into its own block. A call runs against a
//! detached copy of its target contract while the remaining contracts serve
//! as the read-only [`FarmLookup`](crate::contracts::FarmLookup) view; the
//! copy replaces the original only when the call succeeds, so a revert leaves
//! contract state and logs untouched. Sender nonces advance either way.

pub mod contract;
pub mod shared;
mod snapshot;

pub use contract::Contract;
pub use shared::SharedLedger;

use crate::common::{ContractKind, Result};
use crate::config::NodeConfig;
use crate::contracts::{
    AuthorityCenter, CallContext, ChickenEggTracker, Farm, FarmParams, LogEntry,
};
use crate::transaction::{Call, CallOutput, Receipt, Transaction, TransactionStatus};
use crate::types::{contract_address, Address, Timestamp};
use contract::{
    apply_authority_call, apply_farm_call, apply_tracker_call, wrong_kind, DeployedFarms,
};
use log::{debug, info, warn};
use std::collections::HashMap;

/// Largest timestamp a block can carry
pub const MAX_BLOCK_TIMESTAMP: Timestamp = Timestamp::MAX;

/// Effects of a successful call, committed together
struct Outcome {
    contract_address: Option<Address>,
    output: CallOutput,
    logs: Vec<LogEntry>,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    config: NodeConfig,
    contracts: HashMap<Address, Contract>,
    nonces: HashMap<Address, u64>,
    height: u64,
    timestamp: Timestamp,
    next_timestamp: Option<Timestamp>,
    logs: Vec<LogEntry>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(NodeConfig::default())
    }
}

impl Ledger {
    pub fn new(config: NodeConfig) -> Self {
        let timestamp = config.ledger.genesis_timestamp;
        Self {
            config,
            contracts: HashMap::new(),
            nonces: HashMap::new(),
            height: 0,
            timestamp,
            next_timestamp: None,
            logs: Vec::new(),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Number of the last mined block
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Timestamp of the last mined block
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Next nonce `account` will use
    pub fn nonce_of(&self, account: &Address) -> u64 {
        self.nonces.get(account).copied().unwrap_or(0)
    }

    /// Pin the timestamp of the next block. Must move past the last block
    /// and stay below [`MAX_BLOCK_TIMESTAMP`].
    pub fn set_next_block_timestamp(&mut self, timestamp: Timestamp) -> anyhow::Result<()> {
        if timestamp <= self.timestamp {
            anyhow::bail!(
                "Timestamp {} is not after last block timestamp {}",
                timestamp,
                self.timestamp
            );
        }
        if timestamp >= MAX_BLOCK_TIMESTAMP {
            anyhow::bail!("Timestamp {} leaves no room for later blocks", timestamp);
        }
        self.next_timestamp = Some(timestamp);
        Ok(())
    }

    /// Mine `tx` into a new block and report the outcome
    pub fn execute(&mut self, tx: Transaction) -> Receipt {
        let nonce = self.nonce_of(&tx.from);
        self.nonces.insert(tx.from, nonce + 1);
        let tx_hash = tx.hash(nonce);
        let (block_number, timestamp) = self.mine_block();
        let from = tx.from;
        let target = tx.call.target();

        match self.apply(tx, nonce, block_number, timestamp) {
            Ok(outcome) => {
                debug!(
                    "Tx {:?} from {:?} committed in block {} with {} log(s)",
                    tx_hash,
                    from,
                    block_number,
                    outcome.logs.len()
                );
                self.logs.extend(outcome.logs.iter().cloned());
                Receipt {
                    tx_hash,
                    block_number,
                    timestamp,
                    from,
                    nonce,
                    status: TransactionStatus::Success,
                    contract_address: outcome.contract_address,
                    output: outcome.output,
                    logs: outcome.logs,
                    revert_reason: None,
                    error_kind: None,
                }
            }
            Err(e) => {
                match target {
                    Some((address, kind)) => warn!(
                        "Tx {:?} from {:?} to {} {:?} reverted: {}",
                        tx_hash, from, kind, address, e
                    ),
                    None => warn!("Deployment {:?} from {:?} reverted: {}", tx_hash, from, e),
                }
                Receipt::reverted(tx_hash, block_number, timestamp, from, nonce, &e)
            }
        }
    }

    /// Timestamps saturate at [`MAX_BLOCK_TIMESTAMP`]; past it blocks share
    /// the ceiling instead of wrapping.
    fn mine_block(&mut self) -> (u64, Timestamp) {
        let wall_clock = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        let timestamp = self
            .next_timestamp
            .take()
            .unwrap_or(wall_clock)
            .max(self.timestamp.saturating_add(1));

        self.height += 1;
        self.timestamp = timestamp;
        (self.height, timestamp)
    }

    fn apply(
        &mut self,
        tx: Transaction,
        nonce: u64,
        block_number: u64,
        timestamp: Timestamp,
    ) -> Result<Outcome> {
        let from = tx.from;
        match tx.call {
            Call::DeployAuthorityCenter => {
                let center = AuthorityCenter::new(from, self.config.authority.clone());
                self.deploy(from, nonce, block_number, Contract::AuthorityCenter(center))
            }
            Call::DeployFarm {
                owner,
                name,
                metadata_uri,
                authority_center,
            } => {
                if let Some(center) = authority_center {
                    self.authority_center(&center)?;
                }
                let params = FarmParams {
                    owner,
                    name,
                    metadata_uri,
                    authority_center,
                };
                let farm = Farm::new(params, self.config.farm.clone());
                self.deploy(from, nonce, block_number, Contract::Farm(farm))
            }
            Call::DeployTracker { farm } => {
                self.farm(&farm)?;
                let tracker = ChickenEggTracker::new(farm, self.config.tracker.clone());
                self.deploy(from, nonce, block_number, Contract::Tracker(tracker))
            }
            Call::AuthorityCenter { address, call } => {
                let ctx = CallContext::new(from, address, block_number, timestamp);
                self.call_contract(ctx, ContractKind::AuthorityCenter, |contract, ctx, farms| {
                    match contract {
                        Contract::AuthorityCenter(center) => {
                            apply_authority_call(center, ctx, call, farms)
                        }
                        _ => Err(wrong_kind(ContractKind::AuthorityCenter, address)),
                    }
                })
            }
            Call::Farm { address, call } => {
                let ctx = CallContext::new(from, address, block_number, timestamp);
                self.call_contract(ctx, ContractKind::Farm, |contract, ctx, _| match contract {
                    Contract::Farm(farm) => apply_farm_call(farm, ctx, call),
                    _ => Err(wrong_kind(ContractKind::Farm, address)),
                })
            }
            Call::Tracker { address, call } => {
                let ctx = CallContext::new(from, address, block_number, timestamp);
                self.call_contract(ctx, ContractKind::ChickenEggTracker, |contract, ctx, farms| {
                    match contract {
                        Contract::Tracker(tracker) => apply_tracker_call(tracker, ctx, call, farms),
                        _ => Err(wrong_kind(ContractKind::ChickenEggTracker, address)),
                    }
                })
            }
        }
    }

    fn deploy(
        &mut self,
        from: Address,
        nonce: u64,
        block_number: u64,
        contract: Contract,
    ) -> Result<Outcome> {
        let address = contract_address(&from, nonce);
        info!(
            "{} deployed at {:?} by {:?} in block {}",
            contract.kind(),
            address,
            from,
            block_number
        );
        self.contracts.insert(address, contract);
        Ok(Outcome {
            contract_address: Some(address),
            output: CallOutput::None,
            logs: Vec::new(),
        })
    }

    /// Run `f` on a detached copy of the contract `ctx` targets
    fn call_contract<F>(&mut self, mut ctx: CallContext, kind: ContractKind, f: F) -> Result<Outcome>
    where
        F: FnOnce(&mut Contract, &mut CallContext, &DeployedFarms<'_>) -> Result<CallOutput>,
    {
        let address = ctx.contract;
        let original = self
            .contracts
            .remove(&address)
            .ok_or_else(|| wrong_kind(kind, address))?;
        let mut working = original.clone();

        match f(&mut working, &mut ctx, &DeployedFarms(&self.contracts)) {
            Ok(output) => {
                self.contracts.insert(address, working);
                Ok(Outcome {
                    contract_address: None,
                    output,
                    logs: ctx.into_logs(),
                })
            }
            Err(e) => {
                self.contracts.insert(address, original);
                Err(e)
            }
        }
    }

    pub fn contract(&self, address: &Address) -> Option<&Contract> {
        self.contracts.get(address)
    }

    pub fn contracts(&self) -> impl Iterator<Item = (&Address, &Contract)> {
        self.contracts.iter()
    }

    pub fn authority_center(&self, address: &Address) -> Result<&AuthorityCenter> {
        match self.contracts.get(address) {
            Some(Contract::AuthorityCenter(center)) => Ok(center),
            _ => Err(wrong_kind(ContractKind::AuthorityCenter, *address)),
        }
    }

    pub fn farm(&self, address: &Address) -> Result<&Farm> {
        match self.contracts.get(address) {
            Some(Contract::Farm(farm)) => Ok(farm),
            _ => Err(wrong_kind(ContractKind::Farm, *address)),
        }
    }

    pub fn tracker(&self, address: &Address) -> Result<&ChickenEggTracker> {
        match self.contracts.get(address) {
            Some(Contract::Tracker(tracker)) => Ok(tracker),
            _ => Err(wrong_kind(ContractKind::ChickenEggTracker, *address)),
        }
    }

    /// Whether the Farm at `farm` is certified by the AuthorityCenter it
    /// references. A Farm without a reference is never authorized.
    pub fn farm_is_authorized(&self, farm: &Address) -> Result<bool> {
        match self.farm(farm)?.authority_center() {
            Some(center) => Ok(self.authority_center(&center)?.is_certified_farm(farm)),
            None => Ok(false),
        }
    }

    /// All committed logs in mining order
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Committed logs emitted by the contract at `address`
    pub fn logs_for<'a>(&'a self, address: &'a Address) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.logs.iter().filter(move |log| log.address == *address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ErrorKind;
    use crate::contracts::Event;
    use crate::transaction::{AuthorityCall, FarmCall, TrackerCall};

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    const ADMIN: u64 = 1;
    const FARMER: u64 = 2;

    fn deploy(ledger: &mut Ledger, from: u64, call: Call) -> Address {
        let receipt = ledger.execute(Transaction::new(addr(from), call));
        assert!(receipt.is_success(), "{:?}", receipt.revert_reason);
        receipt.contract_address.unwrap()
    }

    fn farm_call(ledger: &mut Ledger, from: u64, farm: Address, call: FarmCall) -> Receipt {
        ledger.execute(Transaction::new(addr(from), Call::Farm { address: farm, call }))
    }

    fn setup() -> (Ledger, Address, Address) {
        let mut ledger = Ledger::default();
        let center = deploy(&mut ledger, ADMIN, Call::DeployAuthorityCenter);
        let farm = deploy(
            &mut ledger,
            FARMER,
            Call::DeployFarm {
                owner: addr(FARMER),
                name: "Sunny Acres".into(),
                metadata_uri: "ipfs://farm".into(),
                authority_center: Some(center),
            },
        );
        (ledger, center, farm)
    }

    #[test]
    fn test_deploy_addresses_follow_sender_nonce() {
        let (ledger, center, farm) = setup();
        assert_eq!(center, contract_address(&addr(ADMIN), 0));
        assert_eq!(farm, contract_address(&addr(FARMER), 0));
        assert_eq!(ledger.nonce_of(&addr(ADMIN)), 1);
        assert_eq!(ledger.height(), 2);
        assert!(ledger.authority_center(&center).unwrap().is_authority(&addr(ADMIN)));
        assert_eq!(ledger.farm(&farm).unwrap().name(), "Sunny Acres");
    }

    #[test]
    fn test_register_chicken_returns_id() {
        let (mut ledger, _, farm) = setup();
        let receipt = farm_call(
            &mut ledger,
            FARMER,
            farm,
            FarmCall::RegisterChicken {
                metadata_uri: "ipfs://c1".into(),
            },
        );
        assert_eq!(receipt.output, CallOutput::ChickenId(1));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].address, farm);
        assert_eq!(ledger.logs_for(&farm).count(), 1);
    }

    #[test]
    fn test_revert_leaves_state_and_logs_untouched() {
        let (mut ledger, _, farm) = setup();
        let before = ledger.farm(&farm).unwrap().clone();
        let logs_before = ledger.logs().len();

        let receipt = farm_call(
            &mut ledger,
            ADMIN,
            farm,
            FarmCall::RegisterChicken {
                metadata_uri: "ipfs://c1".into(),
            },
        );
        assert_eq!(receipt.status, TransactionStatus::Reverted);
        assert_eq!(receipt.error_kind, Some(ErrorKind::Unauthorized));
        assert_eq!(ledger.farm(&farm).unwrap(), &before);
        assert_eq!(ledger.logs().len(), logs_before);
        assert_eq!(ledger.nonce_of(&addr(ADMIN)), 2);
    }

    #[test]
    fn test_call_to_wrong_contract_kind() {
        let (mut ledger, center, farm) = setup();
        let receipt = farm_call(
            &mut ledger,
            FARMER,
            center,
            FarmCall::RegisterChicken {
                metadata_uri: "ipfs://c1".into(),
            },
        );
        assert_eq!(receipt.error_kind, Some(ErrorKind::NotFound));
        assert!(ledger.authority_center(&center).is_ok());

        let receipt = ledger.execute(Transaction::new(
            addr(ADMIN),
            Call::AuthorityCenter {
                address: center,
                call: AuthorityCall::RegisterFarm {
                    farm: center,
                    name: String::new(),
                    location: String::new(),
                    ipfs_hash: String::new(),
                },
            },
        ));
        assert_eq!(receipt.error_kind, Some(ErrorKind::NotFound));
        assert!(!ledger.farm_is_authorized(&farm).unwrap());
    }

    #[test]
    fn test_farm_is_authorized_after_certification() {
        let (mut ledger, center, farm) = setup();
        let receipt = ledger.execute(Transaction::new(
            addr(ADMIN),
            Call::AuthorityCenter {
                address: center,
                call: AuthorityCall::RegisterFarm {
                    farm,
                    name: "Sunny Acres".into(),
                    location: "Valley".into(),
                    ipfs_hash: "QmFarm".into(),
                },
            },
        ));
        assert!(receipt.is_success());
        assert_eq!(receipt.logs[0].event, Event::FarmRegistered { farm });
        assert!(ledger.farm_is_authorized(&farm).unwrap());
    }

    #[test]
    fn test_deploy_tracker_requires_farm() {
        let (mut ledger, center, farm) = setup();
        let receipt = ledger.execute(Transaction::new(
            addr(FARMER),
            Call::DeployTracker { farm: center },
        ));
        assert!(!receipt.is_success());

        let tracker = deploy(&mut ledger, FARMER, Call::DeployTracker { farm });
        let receipt = ledger.execute(Transaction::new(
            addr(FARMER),
            Call::Tracker {
                address: tracker,
                call: TrackerCall::RegisterChicken {
                    chicken_id: "CH001".into(),
                    breed: "Leghorn".into(),
                    birth_date: "2023-01-01".into(),
                    ipfs_hash: "Qm".into(),
                },
            },
        ));
        assert!(receipt.is_success());
        assert!(ledger.tracker(&tracker).unwrap().chicken_info("CH001").is_ok());
    }

    #[test]
    fn test_block_timestamps_strictly_increase() {
        let mut ledger = Ledger::default();
        ledger.set_next_block_timestamp(4_000_000_000).unwrap();
        let first = ledger.execute(Transaction::new(addr(ADMIN), Call::DeployAuthorityCenter));
        let second = ledger.execute(Transaction::new(addr(ADMIN), Call::DeployAuthorityCenter));
        assert_eq!(first.timestamp, 4_000_000_000);
        assert!(second.timestamp > first.timestamp);
        assert_eq!(second.block_number, first.block_number + 1);
        assert!(ledger.set_next_block_timestamp(first.timestamp).is_err());
    }

    #[test]
    fn test_next_block_timestamp_rejects_ceiling() {
        let mut ledger = Ledger::default();
        assert!(ledger.set_next_block_timestamp(MAX_BLOCK_TIMESTAMP).is_err());
        ledger
            .set_next_block_timestamp(MAX_BLOCK_TIMESTAMP - 1)
            .unwrap();

        let first = ledger.execute(Transaction::new(addr(ADMIN), Call::DeployAuthorityCenter));
        let second = ledger.execute(Transaction::new(addr(ADMIN), Call::DeployAuthorityCenter));
        assert_eq!(first.timestamp, MAX_BLOCK_TIMESTAMP - 1);
        assert_eq!(second.timestamp, MAX_BLOCK_TIMESTAMP);
        assert!(second.is_success());
    }

    #[test]
    fn test_genesis_at_ceiling_still_mines() {
        let mut config = NodeConfig::default();
        config.ledger.genesis_timestamp = MAX_BLOCK_TIMESTAMP;
        let mut ledger = Ledger::new(config);

        let first = ledger.execute(Transaction::new(addr(ADMIN), Call::DeployAuthorityCenter));
        let second = ledger.execute(Transaction::new(addr(ADMIN), Call::DeployAuthorityCenter));
        assert!(first.is_success() && second.is_success());
        assert_eq!(second.timestamp, MAX_BLOCK_TIMESTAMP);
        assert_eq!(ledger.height(), 2);
    }
}
