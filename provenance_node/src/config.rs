//! Node configuration
//!
//! Sources are layered: built-in defaults, then an optional file (format
//! picked from its extension), then `PROVENANCE__*` environment variables,
//! e.g. `PROVENANCE__FARM__EGG_PARENT=allow_inactive`.

use crate::policy::{AuthorityPolicy, FarmPolicy, TrackerPolicy};
use crate::types::Timestamp;
use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "PROVENANCE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Policy handed to newly deployed AuthorityCenter contracts
    pub authority: AuthorityPolicy,
    /// Policy handed to newly deployed Farm contracts
    pub farm: FarmPolicy,
    /// Policy handed to newly deployed ChickenEggTracker contracts
    pub tracker: TrackerPolicy,
    pub ledger: LedgerConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Directory holding `state.json`
    pub data_dir: PathBuf,
    /// Timestamp of block 0; block timestamps always move past it
    pub genesis_timestamp: Timestamp,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            genesis_timestamp: 0,
        }
    }
}

impl NodeConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to read node configuration")?;

        let config: Self = settings
            .try_deserialize()
            .context("Invalid node configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Genesis must leave room for at least one later block timestamp
    pub fn validate(&self) -> Result<()> {
        if self.ledger.genesis_timestamp == Timestamp::MAX {
            anyhow::bail!(
                "ledger.genesis_timestamp must be below {}",
                Timestamp::MAX
            );
        }
        Ok(())
    }

    pub fn state_file(&self) -> PathBuf {
        self.ledger.data_dir.join("state.json")
    }
}
