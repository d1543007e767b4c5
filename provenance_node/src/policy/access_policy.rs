use serde::{Deserialize, Serialize};

/// Who may grow the authority set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityAddPolicy {
    /// Only the AuthorityCenter owner may add authorities
    OwnerOnly,
    /// The owner or any existing authority may add authorities
    #[default]
    OwnerOrAuthority,
}

/// Whether an egg may reference a chicken that has been removed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParentLiveness {
    /// Parent must be alive at the moment the egg is registered
    RequireAlive,
    /// Parent only has to have been registered; allows backfilling
    AllowInactive,
}

impl ParentLiveness {
    pub fn requires_alive(&self) -> bool {
        *self == ParentLiveness::RequireAlive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct AuthorityPolicy {
    pub add_policy: AuthorityAddPolicy,
}

impl AuthorityPolicy {
    pub fn owner_only() -> Self {
        Self {
            add_policy: AuthorityAddPolicy::OwnerOnly,
        }
    }

    /// Whether `is_owner`/`is_authority` together allow adding an authority
    pub fn may_add_authority(&self, is_owner: bool, is_authority: bool) -> bool {
        match self.add_policy {
            AuthorityAddPolicy::OwnerOnly => is_owner,
            AuthorityAddPolicy::OwnerOrAuthority => is_owner || is_authority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FarmPolicy {
    pub egg_parent: ParentLiveness,
    /// Reject `update_info` calls with an empty name
    pub reject_empty_name: bool,
}

impl Default for FarmPolicy {
    fn default() -> Self {
        Self {
            egg_parent: ParentLiveness::RequireAlive,
            reject_empty_name: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrackerPolicy {
    pub egg_parent: ParentLiveness,
}

impl Default for TrackerPolicy {
    fn default() -> Self {
        Self {
            egg_parent: ParentLiveness::AllowInactive,
        }
    }
}
