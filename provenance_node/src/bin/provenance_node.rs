use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use provenance_node::{
    config::NodeConfig,
    ledger::Ledger,
    transaction::{Receipt, Transaction},
};
use std::fs;
use std::path::PathBuf;

/// Provenance Node Arguments
#[derive(Parser)]
#[clap(name = "provenance-node")]
#[clap(about = "Farm provenance registry node - replays transactions against the registry ledger")]
struct Args {
    /// Path to node configuration file
    #[clap(long, default_value = "config/node.yaml")]
    config_path: PathBuf,

    /// JSON file holding an array of transactions to execute
    #[clap(long)]
    transactions: PathBuf,

    /// Load the saved ledger snapshot before executing
    #[clap(long)]
    resume: bool,

    /// Persist the ledger snapshot after executing
    #[clap(long)]
    save: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting provenance node...");
    info!("Config path: {:?}", args.config_path);

    let config = NodeConfig::load(Some(&args.config_path))?;
    let mut ledger = Ledger::new(config);

    if args.resume && !ledger.load_state()? {
        warn!(
            "No snapshot at {}, starting from genesis",
            ledger.config().state_file().display()
        );
    }

    let raw = fs::read(&args.transactions)
        .with_context(|| format!("Failed to read {}", args.transactions.display()))?;
    let transactions: Vec<Transaction> =
        serde_json::from_slice(&raw).context("Transactions file must be a JSON array")?;
    info!("Executing {} transaction(s)", transactions.len());

    let receipts: Vec<Receipt> = transactions
        .into_iter()
        .map(|tx| ledger.execute(tx))
        .collect();

    for receipt in &receipts {
        if let Some(address) = receipt.contract_address {
            info!("Contract created at 0x{}", hex::encode(address.as_bytes()));
        }
    }
    let reverted = receipts.iter().filter(|r| !r.is_success()).count();
    info!(
        "Done: {} succeeded, {} reverted, height {}",
        receipts.len() - reverted,
        reverted,
        ledger.height()
    );

    for (address, contract) in ledger.contracts() {
        info!(
            "{} 0x{}: {}",
            contract.kind(),
            hex::encode(address.as_bytes()),
            contract.summary()
        );
    }

    println!("{}", serde_json::to_string_pretty(&receipts)?);

    if args.save {
        ledger.save_state()?;
    }

    Ok(())
}
