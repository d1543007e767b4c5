//! AuthorityCenter: root access-control registry.
//!
//! Owns the authority set and the farm certification map. The deploying
//! account becomes the immutable owner and the first authority.

use super::{CallContext, Event, FarmLookup};
use crate::common::{ContractKind, Error, Result};
use crate::policy::{AuthorityAddPolicy, AuthorityPolicy};
use crate::types::{Address, Timestamp};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Descriptive data submitted with a certification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmProfile {
    pub name: String,
    pub location: String,
    pub ipfs_hash: String,
}

/// Certification record of a farm contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmCertification {
    pub farm: Address,
    pub profile: FarmProfile,
    /// Cleared by `remove_farm`; the rest of the record is kept as history
    pub is_registered: bool,
    pub registered_at: Timestamp,
    pub registered_by: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityCenter {
    owner: Address,
    authorities: BTreeSet<Address>,
    certifications: BTreeMap<Address, FarmCertification>,
    policy: AuthorityPolicy,
}

impl AuthorityCenter {
    pub fn new(owner: Address, policy: AuthorityPolicy) -> Self {
        let mut authorities = BTreeSet::new();
        authorities.insert(owner);
        Self {
            owner,
            authorities,
            certifications: BTreeMap::new(),
            policy,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn policy(&self) -> &AuthorityPolicy {
        &self.policy
    }

    pub fn is_authority(&self, account: &Address) -> bool {
        self.authorities.contains(account)
    }

    pub fn is_certified_farm(&self, farm: &Address) -> bool {
        self.certifications
            .get(farm)
            .map(|c| c.is_registered)
            .unwrap_or(false)
    }

    /// Certification record of `farm`, active or not
    pub fn certification(&self, farm: &Address) -> Option<&FarmCertification> {
        self.certifications.get(farm)
    }

    pub fn authorities(&self) -> impl Iterator<Item = &Address> {
        self.authorities.iter()
    }

    /// Currently certified farms in address order
    pub fn certified_farms(&self) -> impl Iterator<Item = &FarmCertification> {
        self.certifications.values().filter(|c| c.is_registered)
    }

    pub fn add_authority(&mut self, ctx: &mut CallContext, account: Address) -> Result<()> {
        let is_owner = ctx.caller == self.owner;
        if !self
            .policy
            .may_add_authority(is_owner, self.is_authority(&ctx.caller))
        {
            return Err(match self.policy.add_policy {
                AuthorityAddPolicy::OwnerOnly => Error::NotOwner,
                AuthorityAddPolicy::OwnerOrAuthority => Error::NotAuthority,
            });
        }
        if self.is_authority(&account) {
            return Err(Error::AlreadyAuthority);
        }

        self.authorities.insert(account);
        ctx.emit(Event::AuthorityAdded { account });
        info!("Authority {:?} added by {:?}", account, ctx.caller);
        Ok(())
    }

    /// Owner-only, so authorities cannot strip each other
    pub fn remove_authority(&mut self, ctx: &mut CallContext, account: Address) -> Result<()> {
        if ctx.caller != self.owner {
            return Err(Error::NotOwner);
        }
        if !self.is_authority(&account) {
            return Err(Error::AuthorityNotFound(account));
        }
        if account == self.owner {
            return Err(Error::OwnerAuthorityRequired);
        }

        self.authorities.remove(&account);
        ctx.emit(Event::AuthorityRemoved { account });
        info!("Authority {:?} removed", account);
        Ok(())
    }

    /// Certify `farm`.
    ///
    /// The farm must be a deployed Farm contract with no chickens yet. The
    /// chicken count is read through `farms` before any write happens.
    pub fn register_farm(
        &mut self,
        ctx: &mut CallContext,
        farm: Address,
        profile: FarmProfile,
        farms: &dyn FarmLookup,
    ) -> Result<()> {
        if !self.is_authority(&ctx.caller) {
            return Err(Error::NotAuthority);
        }
        if self.is_certified_farm(&farm) {
            return Err(Error::FarmAlreadyRegistered);
        }
        let chicken_count = farms.chicken_count_of(&farm).ok_or(Error::ContractNotFound {
            kind: ContractKind::Farm,
            address: farm,
        })?;
        if chicken_count > 0 {
            debug!("Farm {:?} rejected with {} chicken(s)", farm, chicken_count);
            return Err(Error::FarmHasExistingChickens);
        }

        self.certifications.insert(
            farm,
            FarmCertification {
                farm,
                profile,
                is_registered: true,
                registered_at: ctx.block_timestamp,
                registered_by: ctx.caller,
            },
        );
        ctx.emit(Event::FarmRegistered { farm });
        info!("Farm {:?} certified by {:?}", farm, ctx.caller);
        Ok(())
    }

    pub fn remove_farm(&mut self, ctx: &mut CallContext, farm: Address) -> Result<()> {
        if !self.is_authority(&ctx.caller) {
            return Err(Error::NotAuthority);
        }
        let record = match self.certifications.get_mut(&farm) {
            Some(record) if record.is_registered => record,
            _ => return Err(Error::FarmNotRegistered),
        };

        record.is_registered = false;
        ctx.emit(Event::FarmRemoved { farm });
        debug!("Farm {:?} certification revoked", farm);
        Ok(())
    }
}
