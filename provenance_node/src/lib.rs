//! Farm provenance registry node.
//!
//! Hosts the three registry contracts (AuthorityCenter, Farm and
//! ChickenEggTracker) on a serial, atomic ledger that mines one block per
//! transaction.

pub mod common;
pub mod config;
pub mod contracts;
pub mod ledger;
pub mod policy;
pub mod transaction;
pub mod types;

pub use common::{Error, ErrorKind, Result};
pub use ledger::{Ledger, SharedLedger};
