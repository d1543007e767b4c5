//! ChickenEggTracker: string-keyed chicken/egg ledger bound to one Farm.
//!
//! The tracker keeps its own records, independent of the Farm's integer-id
//! registry. It holds no owner of its own: every mutation asks the injected
//! [`FarmLookup`] who owns the bound Farm and requires the caller to be that
//! account.

use super::{CallContext, Event, FarmLookup};
use crate::common::{Error, Result};
use crate::policy::TrackerPolicy;
use crate::types::{Address, Timestamp};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedChicken {
    pub chicken_id: String,
    pub breed: String,
    /// Free-form, not validated
    pub birth_date: String,
    pub ipfs_hash: String,
    pub is_active: bool,
    pub registration_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEgg {
    pub egg_id: String,
    pub chicken_id: String,
    /// Free-form, not validated
    pub production_date: String,
    pub ipfs_hash: String,
    pub is_active: bool,
    pub registration_date: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChickenEggTracker {
    farm: Address,
    chickens: BTreeMap<String, TrackedChicken>,
    eggs: BTreeMap<String, TrackedEgg>,
    policy: TrackerPolicy,
}

impl ChickenEggTracker {
    pub fn new(farm: Address, policy: TrackerPolicy) -> Self {
        Self {
            farm,
            chickens: BTreeMap::new(),
            eggs: BTreeMap::new(),
            policy,
        }
    }

    pub fn farm(&self) -> Address {
        self.farm
    }

    pub fn policy(&self) -> &TrackerPolicy {
        &self.policy
    }

    pub fn chicken_info(&self, id: &str) -> Result<&TrackedChicken> {
        self.chickens.get(id).ok_or(Error::ChickenNotFound)
    }

    pub fn egg_info(&self, id: &str) -> Result<&TrackedEgg> {
        self.eggs.get(id).ok_or(Error::EggNotFound)
    }

    pub fn chickens(&self) -> impl Iterator<Item = &TrackedChicken> {
        self.chickens.values()
    }

    pub fn eggs(&self) -> impl Iterator<Item = &TrackedEgg> {
        self.eggs.values()
    }

    fn ensure_farm_owner(&self, ctx: &CallContext, farms: &dyn FarmLookup) -> Result<()> {
        match farms.owner_of(&self.farm) {
            Some(owner) if owner == ctx.caller => Ok(()),
            _ => Err(Error::NotFarmOwner),
        }
    }

    pub fn register_chicken(
        &mut self,
        ctx: &mut CallContext,
        farms: &dyn FarmLookup,
        id: String,
        breed: String,
        birth_date: String,
        ipfs_hash: String,
    ) -> Result<()> {
        self.ensure_farm_owner(ctx, farms)?;
        if self.chickens.contains_key(&id) {
            return Err(Error::ChickenAlreadyRegistered);
        }

        self.chickens.insert(
            id.clone(),
            TrackedChicken {
                chicken_id: id.clone(),
                breed,
                birth_date,
                ipfs_hash,
                is_active: true,
                registration_date: ctx.block_timestamp,
            },
        );
        debug!("Tracker {:?}: chicken {} registered", ctx.contract, id);
        ctx.emit(Event::TrackedChickenRegistered { chicken_id: id });
        Ok(())
    }

    pub fn update_chicken_info(
        &mut self,
        ctx: &mut CallContext,
        farms: &dyn FarmLookup,
        id: String,
        ipfs_hash: String,
    ) -> Result<()> {
        self.ensure_farm_owner(ctx, farms)?;
        let chicken = self.chickens.get_mut(&id).ok_or(Error::ChickenNotFound)?;

        chicken.ipfs_hash = ipfs_hash;
        ctx.emit(Event::TrackedChickenUpdated { chicken_id: id });
        Ok(())
    }

    pub fn remove_chicken(
        &mut self,
        ctx: &mut CallContext,
        farms: &dyn FarmLookup,
        id: String,
    ) -> Result<()> {
        self.ensure_farm_owner(ctx, farms)?;
        let chicken = self.chickens.get_mut(&id).ok_or(Error::ChickenNotFound)?;

        chicken.is_active = false;
        ctx.emit(Event::TrackedChickenRemoved { chicken_id: id });
        Ok(())
    }

    pub fn register_egg(
        &mut self,
        ctx: &mut CallContext,
        farms: &dyn FarmLookup,
        id: String,
        chicken_id: String,
        production_date: String,
        ipfs_hash: String,
    ) -> Result<()> {
        self.ensure_farm_owner(ctx, farms)?;
        let parent = self
            .chickens
            .get(&chicken_id)
            .ok_or(Error::ChickenNotRegistered)?;
        if self.policy.egg_parent.requires_alive() && !parent.is_active {
            return Err(Error::ChickenNotAlive);
        }
        if self.eggs.contains_key(&id) {
            return Err(Error::EggAlreadyRegistered);
        }

        self.eggs.insert(
            id.clone(),
            TrackedEgg {
                egg_id: id.clone(),
                chicken_id: chicken_id.clone(),
                production_date,
                ipfs_hash,
                is_active: true,
                registration_date: ctx.block_timestamp,
            },
        );
        ctx.emit(Event::TrackedEggRegistered {
            egg_id: id,
            chicken_id,
        });
        Ok(())
    }

    pub fn update_egg_info(
        &mut self,
        ctx: &mut CallContext,
        farms: &dyn FarmLookup,
        id: String,
        ipfs_hash: String,
    ) -> Result<()> {
        self.ensure_farm_owner(ctx, farms)?;
        let egg = self.eggs.get_mut(&id).ok_or(Error::EggNotFound)?;

        egg.ipfs_hash = ipfs_hash;
        ctx.emit(Event::TrackedEggUpdated { egg_id: id });
        Ok(())
    }

    pub fn remove_egg(
        &mut self,
        ctx: &mut CallContext,
        farms: &dyn FarmLookup,
        id: String,
    ) -> Result<()> {
        self.ensure_farm_owner(ctx, farms)?;
        let egg = self.eggs.get_mut(&id).ok_or(Error::EggNotFound)?;

        egg.is_active = false;
        ctx.emit(Event::TrackedEggRemoved { egg_id: id });
        Ok(())
    }
}
