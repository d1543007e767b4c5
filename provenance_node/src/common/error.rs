//! Error taxonomy for the provenance registry.
//!
//! Every failure a contract call can produce is a distinct variant whose
//! `Display` text is the revert reason surfaced to clients. Those strings are
//! part of the external interface and must stay stable.

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a revert, shared by all contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller lacks the role required by the operation
    Unauthorized,
    /// Duplicate registration of an authority, farm, chicken or egg
    AlreadyExists,
    /// Reference to an authority, farm, chicken, egg or contract that does not exist
    NotFound,
    /// The referenced record exists but its state forbids the operation
    InvalidState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::InvalidState => "InvalidState",
        };
        f.write_str(label)
    }
}

/// Contract kinds, used when a call targets the wrong address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    AuthorityCenter,
    Farm,
    ChickenEggTracker,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContractKind::AuthorityCenter => "AuthorityCenter",
            ContractKind::Farm => "Farm",
            ContractKind::ChickenEggTracker => "ChickenEggTracker",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Only owner can call this function")]
    NotOwner,

    #[error("Only authority or owner can call this function")]
    NotAuthority,

    #[error("Only farm owner can call this function")]
    NotFarmOwner,

    #[error("Already an authority")]
    AlreadyAuthority,

    #[error("Not an authority")]
    AuthorityNotFound(Address),

    #[error("Owner cannot be removed from authorities")]
    OwnerAuthorityRequired,

    #[error("Farm already registered")]
    FarmAlreadyRegistered,

    #[error("Farm not registered")]
    FarmNotRegistered,

    #[error("Farm already has chickens")]
    FarmHasExistingChickens,

    #[error("Farm name must not be empty")]
    EmptyFarmName,

    #[error("Chicken not found")]
    ChickenNotFound,

    #[error("Chicken not registered")]
    ChickenNotRegistered,

    #[error("Chicken already registered")]
    ChickenAlreadyRegistered,

    #[error("Chicken is not alive")]
    ChickenNotAlive,

    #[error("Egg not found")]
    EggNotFound,

    #[error("Egg already registered")]
    EggAlreadyRegistered,

    #[error("No {kind} contract at {address:?}")]
    ContractNotFound { kind: ContractKind, address: Address },
}

impl RegistryError {
    /// Taxonomy bucket of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::NotOwner | RegistryError::NotAuthority | RegistryError::NotFarmOwner => {
                ErrorKind::Unauthorized
            }
            RegistryError::AlreadyAuthority
            | RegistryError::FarmAlreadyRegistered
            | RegistryError::ChickenAlreadyRegistered
            | RegistryError::EggAlreadyRegistered => ErrorKind::AlreadyExists,
            RegistryError::AuthorityNotFound(_)
            | RegistryError::FarmNotRegistered
            | RegistryError::ChickenNotFound
            | RegistryError::ChickenNotRegistered
            | RegistryError::EggNotFound
            | RegistryError::ContractNotFound { .. } => ErrorKind::NotFound,
            RegistryError::OwnerAuthorityRequired
            | RegistryError::FarmHasExistingChickens
            | RegistryError::EmptyFarmName
            | RegistryError::ChickenNotAlive => ErrorKind::InvalidState,
        }
    }

    /// Human-readable revert reason reported in receipts
    pub fn revert_reason(&self) -> String {
        self.to_string()
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind() == ErrorKind::Unauthorized
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revert_reasons_are_stable() {
        assert_eq!(
            RegistryError::NotOwner.revert_reason(),
            "Only owner can call this function"
        );
        assert_eq!(
            RegistryError::FarmHasExistingChickens.revert_reason(),
            "Farm already has chickens"
        );
        assert_eq!(RegistryError::ChickenNotAlive.revert_reason(), "Chicken is not alive");
        assert_eq!(
            RegistryError::AuthorityNotFound(Address::zero()).revert_reason(),
            "Not an authority"
        );
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(RegistryError::NotFarmOwner.kind(), ErrorKind::Unauthorized);
        assert_eq!(RegistryError::FarmAlreadyRegistered.kind(), ErrorKind::AlreadyExists);
        assert_eq!(RegistryError::ChickenNotRegistered.kind(), ErrorKind::NotFound);
        assert_eq!(RegistryError::ChickenNotAlive.kind(), ErrorKind::InvalidState);
        assert_eq!(
            RegistryError::ContractNotFound {
                kind: ContractKind::Farm,
                address: Address::zero(),
            }
            .kind(),
            ErrorKind::NotFound
        );
    }
}
