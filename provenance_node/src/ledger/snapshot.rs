use super::{Contract, Ledger};
use crate::contracts::LogEntry;
use crate::types::{Address, Timestamp};
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;

/// Serializable ledger data for persistence
#[derive(Serialize, Deserialize)]
struct StateData {
    height: u64,
    timestamp: Timestamp,
    contracts: Vec<(Address, Contract)>,
    nonces: Vec<(Address, u64)>,
    logs: Vec<LogEntry>,
}

impl Ledger {
    /// Save state to `<data_dir>/state.json`
    pub fn save_state(&self) -> Result<()> {
        let mut contracts: Vec<_> = self
            .contracts
            .iter()
            .map(|(address, contract)| (*address, contract.clone()))
            .collect();
        contracts.sort_by_key(|(address, _)| *address);
        let mut nonces: Vec<_> = self.nonces.iter().map(|(a, n)| (*a, *n)).collect();
        nonces.sort();

        let state_data = StateData {
            height: self.height,
            timestamp: self.timestamp,
            contracts,
            nonces,
            logs: self.logs.clone(),
        };

        fs::create_dir_all(&self.config.ledger.data_dir).with_context(|| {
            format!("Failed to create {}", self.config.ledger.data_dir.display())
        })?;
        let path = self.config.state_file();
        let data = serde_json::to_vec_pretty(&state_data)?;
        fs::write(&path, data).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("State saved to {}: height={}", path.display(), self.height);
        Ok(())
    }

    /// Load state from disk. Returns `false` when no snapshot exists.
    pub fn load_state(&mut self) -> Result<bool> {
        let path = self.config.state_file();
        if !path.exists() {
            return Ok(false);
        }

        let data = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let state_data: StateData = serde_json::from_slice(&data)
            .with_context(|| format!("Corrupt snapshot {}", path.display()))?;

        self.height = state_data.height;
        self.timestamp = state_data.timestamp;
        self.next_timestamp = None;
        self.contracts = state_data.contracts.into_iter().collect();
        self.nonces = state_data.nonces.into_iter().collect();
        self.logs = state_data.logs;

        info!(
            "State loaded from {}: height={}, contracts={}",
            path.display(),
            self.height,
            self.contracts.len()
        );
        Ok(true)
    }
}
