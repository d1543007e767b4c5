use super::Ledger;
use crate::transaction::{Receipt, Transaction};
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe handle to a [`Ledger`].
///
/// Submissions take the write lock, so transactions from concurrent clients
/// are applied one at a time. Reads share the lock.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn submit(&self, tx: Transaction) -> Receipt {
        self.inner.write().execute(tx)
    }

    pub fn submit_batch(&self, txs: impl IntoIterator<Item = Transaction>) -> Vec<Receipt> {
        let mut ledger = self.inner.write();
        txs.into_iter().map(|tx| ledger.execute(tx)).collect()
    }

    /// Run `f` against a consistent view of the ledger
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.inner.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Call, FarmCall};
    use crate::types::Address;
    use std::thread;

    #[test]
    fn test_submit_batch_mines_in_order() {
        let shared = SharedLedger::default();
        let sender = Address::from_low_u64_be(3);
        let receipts = shared.submit_batch(vec![
            Transaction::new(sender, Call::DeployAuthorityCenter),
            Transaction::new(sender, Call::DeployTracker { farm: Address::zero() }),
        ]);

        assert!(receipts[0].is_success());
        assert!(!receipts[1].is_success());
        assert_eq!(receipts[1].block_number, receipts[0].block_number + 1);
        assert_eq!(shared.read(|ledger| ledger.nonce_of(&sender)), 2);
    }

    #[test]
    fn test_concurrent_submitters_get_unique_ids() {
        let owner = Address::from_low_u64_be(7);
        let shared = SharedLedger::default();
        let farm = shared
            .submit(Transaction::new(
                owner,
                Call::DeployFarm {
                    owner,
                    name: "Shared".into(),
                    metadata_uri: String::new(),
                    authority_center: None,
                },
            ))
            .contract_address
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        let receipt = shared.submit(Transaction::new(
                            owner,
                            Call::Farm {
                                address: farm,
                                call: FarmCall::RegisterChicken {
                                    metadata_uri: "ipfs://c".into(),
                                },
                            },
                        ));
                        assert!(receipt.is_success());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        shared.read(|ledger| {
            let farm = ledger.farm(&farm).unwrap();
            assert_eq!(farm.chicken_count(), 100);
            assert!((1..=100).all(|id| farm.chicken(id).is_some()));
            assert_eq!(ledger.nonce_of(&owner), 101);
        });
    }
}
