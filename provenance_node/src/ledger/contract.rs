//! Deployed contract storage and call dispatch

use crate::common::{ContractKind, Error, Result};
use crate::contracts::{
    AuthorityCenter, CallContext, ChickenEggTracker, Farm, FarmLookup, FarmProfile,
};
use crate::transaction::{AuthorityCall, CallOutput, FarmCall, TrackerCall};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A contract instance living at some address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contract {
    AuthorityCenter(AuthorityCenter),
    Farm(Farm),
    Tracker(ChickenEggTracker),
}

impl Contract {
    pub fn kind(&self) -> ContractKind {
        match self {
            Contract::AuthorityCenter(_) => ContractKind::AuthorityCenter,
            Contract::Farm(_) => ContractKind::Farm,
            Contract::Tracker(_) => ContractKind::ChickenEggTracker,
        }
    }

    /// One-line description of the contract's current records
    pub fn summary(&self) -> String {
        match self {
            Contract::AuthorityCenter(center) => format!(
                "{} authorities, {} certified farms",
                center.authorities().count(),
                center.certified_farms().count()
            ),
            Contract::Farm(farm) => format!(
                "\"{}\" owned by {:?}, {} chickens, {} eggs",
                farm.name(),
                farm.owner(),
                farm.chicken_count(),
                farm.egg_count()
            ),
            Contract::Tracker(tracker) => format!(
                "farm {:?}, {} of {} chickens active, {} of {} eggs active",
                tracker.farm(),
                tracker.chickens().filter(|c| c.is_active).count(),
                tracker.chickens().count(),
                tracker.eggs().filter(|e| e.is_active).count(),
                tracker.eggs().count()
            ),
        }
    }
}

/// Farm view over the contracts not currently executing
pub(crate) struct DeployedFarms<'a>(pub(crate) &'a HashMap<Address, Contract>);

impl FarmLookup for DeployedFarms<'_> {
    fn owner_of(&self, farm: &Address) -> Option<Address> {
        match self.0.get(farm) {
            Some(Contract::Farm(farm)) => Some(farm.owner()),
            _ => None,
        }
    }

    fn chicken_count_of(&self, farm: &Address) -> Option<u64> {
        match self.0.get(farm) {
            Some(Contract::Farm(farm)) => Some(farm.chicken_count()),
            _ => None,
        }
    }
}

pub(crate) fn apply_authority_call(
    center: &mut AuthorityCenter,
    ctx: &mut CallContext,
    call: AuthorityCall,
    farms: &dyn FarmLookup,
) -> Result<CallOutput> {
    match call {
        AuthorityCall::AddAuthority { account } => center.add_authority(ctx, account)?,
        AuthorityCall::RemoveAuthority { account } => center.remove_authority(ctx, account)?,
        AuthorityCall::RegisterFarm {
            farm,
            name,
            location,
            ipfs_hash,
        } => {
            let profile = FarmProfile {
                name,
                location,
                ipfs_hash,
            };
            center.register_farm(ctx, farm, profile, farms)?
        }
        AuthorityCall::RemoveFarm { farm } => center.remove_farm(ctx, farm)?,
    }
    Ok(CallOutput::None)
}

pub(crate) fn apply_farm_call(
    farm: &mut Farm,
    ctx: &mut CallContext,
    call: FarmCall,
) -> Result<CallOutput> {
    let output = match call {
        FarmCall::UpdateInfo { name, metadata_uri } => {
            farm.update_info(ctx, name, metadata_uri)?;
            CallOutput::None
        }
        FarmCall::RegisterChicken { metadata_uri } => {
            CallOutput::ChickenId(farm.register_chicken(ctx, metadata_uri)?)
        }
        FarmCall::RemoveChicken { chicken_id } => {
            farm.remove_chicken(ctx, chicken_id)?;
            CallOutput::None
        }
        FarmCall::UpdateChickenInfo {
            chicken_id,
            metadata_uri,
        } => {
            farm.update_chicken_info(ctx, chicken_id, metadata_uri)?;
            CallOutput::None
        }
        FarmCall::RegisterEgg {
            chicken_id,
            metadata_uri,
        } => CallOutput::EggId(farm.register_egg(ctx, chicken_id, metadata_uri)?),
        FarmCall::UpdateEggInfo {
            egg_id,
            metadata_uri,
        } => {
            farm.update_egg_info(ctx, egg_id, metadata_uri)?;
            CallOutput::None
        }
    };
    Ok(output)
}

pub(crate) fn apply_tracker_call(
    tracker: &mut ChickenEggTracker,
    ctx: &mut CallContext,
    call: TrackerCall,
    farms: &dyn FarmLookup,
) -> Result<CallOutput> {
    match call {
        TrackerCall::RegisterChicken {
            chicken_id,
            breed,
            birth_date,
            ipfs_hash,
        } => tracker.register_chicken(ctx, farms, chicken_id, breed, birth_date, ipfs_hash)?,
        TrackerCall::UpdateChickenInfo {
            chicken_id,
            ipfs_hash,
        } => tracker.update_chicken_info(ctx, farms, chicken_id, ipfs_hash)?,
        TrackerCall::RemoveChicken { chicken_id } => {
            tracker.remove_chicken(ctx, farms, chicken_id)?
        }
        TrackerCall::RegisterEgg {
            egg_id,
            chicken_id,
            production_date,
            ipfs_hash,
        } => tracker.register_egg(ctx, farms, egg_id, chicken_id, production_date, ipfs_hash)?,
        TrackerCall::UpdateEggInfo { egg_id, ipfs_hash } => {
            tracker.update_egg_info(ctx, farms, egg_id, ipfs_hash)?
        }
        TrackerCall::RemoveEgg { egg_id } => tracker.remove_egg(ctx, farms, egg_id)?,
    }
    Ok(CallOutput::None)
}

pub(crate) fn wrong_kind(kind: ContractKind, address: Address) -> Error {
    Error::ContractNotFound { kind, address }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{CallContext, FarmParams};
    use crate::policy::{AuthorityPolicy, FarmPolicy, TrackerPolicy};

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn test_summary_counts_records() {
        let mut center = AuthorityCenter::new(addr(1), AuthorityPolicy::default());
        center
            .add_authority(&mut CallContext::new(addr(1), addr(100), 1, 10), addr(2))
            .unwrap();
        assert_eq!(
            Contract::AuthorityCenter(center).summary(),
            "2 authorities, 0 certified farms"
        );

        let farm = Farm::new(
            FarmParams {
                owner: addr(3),
                name: "Hill".into(),
                metadata_uri: String::new(),
                authority_center: None,
            },
            FarmPolicy::default(),
        );
        let mut contracts = HashMap::new();
        contracts.insert(addr(200), Contract::Farm(farm));

        let mut tracker = ChickenEggTracker::new(addr(200), TrackerPolicy::default());
        let mut ctx = CallContext::new(addr(3), addr(300), 2, 20);
        let farms = DeployedFarms(&contracts);
        tracker
            .register_chicken(&mut ctx, &farms, "CH1".into(), "Silkie".into(), "2024".into(), "Qm".into())
            .unwrap();
        tracker
            .register_egg(&mut ctx, &farms, "E1".into(), "CH1".into(), "2024".into(), "Qm".into())
            .unwrap();
        tracker.remove_egg(&mut ctx, &farms, "E1".into()).unwrap();

        assert_eq!(
            Contract::Tracker(tracker).summary(),
            format!("farm {:?}, 1 of 1 chickens active, 0 of 1 eggs active", addr(200))
        );
        assert!(contracts[&addr(200)].summary().contains("0 chickens"));
    }
}
