//! Farm: per-farm registry of chickens and eggs.
//!
//! Chicken and egg ids are assigned from 1 upwards by bumping the matching
//! counter, so `chicken_count` is both the number of chickens ever registered
//! and the highest valid id. Removal only flips `is_alive`; ids are never
//! reused. Eggs are permanent once registered.

use super::{CallContext, Event};
use crate::common::{Error, Result};
use crate::policy::FarmPolicy;
use crate::types::{Address, Timestamp};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Constructor arguments of a Farm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmParams {
    pub owner: Address,
    pub name: String,
    pub metadata_uri: String,
    /// AuthorityCenter consulted for certification status, if any
    #[serde(default)]
    pub authority_center: Option<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chicken {
    pub id: u64,
    pub birth_time: Timestamp,
    pub metadata_uri: String,
    pub is_alive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Egg {
    pub id: u64,
    pub chicken_id: u64,
    pub birth_time: Timestamp,
    pub metadata_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    owner: Address,
    authority_center: Option<Address>,
    name: String,
    metadata_uri: String,
    chicken_count: u64,
    egg_count: u64,
    chickens: BTreeMap<u64, Chicken>,
    eggs: BTreeMap<u64, Egg>,
    policy: FarmPolicy,
}

impl Farm {
    pub fn new(params: FarmParams, policy: FarmPolicy) -> Self {
        Self {
            owner: params.owner,
            authority_center: params.authority_center,
            name: params.name,
            metadata_uri: params.metadata_uri,
            chicken_count: 0,
            egg_count: 0,
            chickens: BTreeMap::new(),
            eggs: BTreeMap::new(),
            policy,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn authority_center(&self) -> Option<Address> {
        self.authority_center
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata_uri(&self) -> &str {
        &self.metadata_uri
    }

    pub fn chicken_count(&self) -> u64 {
        self.chicken_count
    }

    pub fn egg_count(&self) -> u64 {
        self.egg_count
    }

    pub fn policy(&self) -> &FarmPolicy {
        &self.policy
    }

    pub fn chicken(&self, id: u64) -> Option<&Chicken> {
        self.chickens.get(&id)
    }

    pub fn egg(&self, id: u64) -> Option<&Egg> {
        self.eggs.get(&id)
    }

    /// Eggs laid by `chicken_id`, oldest first
    pub fn eggs_of(&self, chicken_id: u64) -> impl Iterator<Item = &Egg> {
        self.eggs.values().filter(move |e| e.chicken_id == chicken_id)
    }

    fn ensure_owner(&self, ctx: &CallContext) -> Result<()> {
        if ctx.caller != self.owner {
            return Err(Error::NotOwner);
        }
        Ok(())
    }

    pub fn update_info(
        &mut self,
        ctx: &mut CallContext,
        name: String,
        metadata_uri: String,
    ) -> Result<()> {
        self.ensure_owner(ctx)?;
        if self.policy.reject_empty_name && name.trim().is_empty() {
            return Err(Error::EmptyFarmName);
        }

        self.name = name.clone();
        self.metadata_uri = metadata_uri.clone();
        ctx.emit(Event::FarmInfoUpdated { name, metadata_uri });
        Ok(())
    }

    pub fn register_chicken(&mut self, ctx: &mut CallContext, metadata_uri: String) -> Result<u64> {
        self.ensure_owner(ctx)?;

        self.chicken_count += 1;
        let id = self.chicken_count;
        self.chickens.insert(
            id,
            Chicken {
                id,
                birth_time: ctx.block_timestamp,
                metadata_uri,
                is_alive: true,
            },
        );
        ctx.emit(Event::ChickenRegistered { chicken_id: id });
        debug!("Chicken {} registered on farm {:?}", id, ctx.contract);
        Ok(id)
    }

    /// Mark a chicken as no longer alive. Repeating the call is a no-op.
    pub fn remove_chicken(&mut self, ctx: &mut CallContext, id: u64) -> Result<()> {
        self.ensure_owner(ctx)?;
        let chicken = self.chickens.get_mut(&id).ok_or(Error::ChickenNotFound)?;
        if !chicken.is_alive {
            return Ok(());
        }

        chicken.is_alive = false;
        ctx.emit(Event::ChickenRemoved { chicken_id: id });
        Ok(())
    }

    /// Replace a live chicken's metadata URI
    pub fn update_chicken_info(
        &mut self,
        ctx: &mut CallContext,
        id: u64,
        metadata_uri: String,
    ) -> Result<()> {
        self.ensure_owner(ctx)?;
        let chicken = self.chickens.get_mut(&id).ok_or(Error::ChickenNotFound)?;
        if !chicken.is_alive {
            return Err(Error::ChickenNotAlive);
        }

        chicken.metadata_uri = metadata_uri;
        ctx.emit(Event::ChickenInfoUpdated { chicken_id: id });
        Ok(())
    }

    pub fn register_egg(
        &mut self,
        ctx: &mut CallContext,
        chicken_id: u64,
        metadata_uri: String,
    ) -> Result<u64> {
        self.ensure_owner(ctx)?;
        let parent = self.chickens.get(&chicken_id).ok_or(Error::ChickenNotFound)?;
        if self.policy.egg_parent.requires_alive() && !parent.is_alive {
            return Err(Error::ChickenNotAlive);
        }

        self.egg_count += 1;
        let id = self.egg_count;
        self.eggs.insert(
            id,
            Egg {
                id,
                chicken_id,
                birth_time: ctx.block_timestamp,
                metadata_uri,
            },
        );
        ctx.emit(Event::EggRegistered {
            egg_id: id,
            chicken_id,
        });
        debug!("Egg {} from chicken {} registered", id, chicken_id);
        Ok(id)
    }

    /// Replace an egg's metadata URI; the parent link and birth time are fixed
    pub fn update_egg_info(
        &mut self,
        ctx: &mut CallContext,
        id: u64,
        metadata_uri: String,
    ) -> Result<()> {
        self.ensure_owner(ctx)?;
        let egg = self.eggs.get_mut(&id).ok_or(Error::EggNotFound)?;

        egg.metadata_uri = metadata_uri;
        ctx.emit(Event::EggInfoUpdated { egg_id: id });
        Ok(())
    }
}
