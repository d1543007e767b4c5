//! Primitive chain types shared by every contract and the ledger.

use rlp::RlpStream;
use tiny_keccak::{Hasher, Keccak};

/// 20-byte account or contract address
pub type Address = ethereum_types::H160;

/// 32-byte hash (transaction hashes)
pub type Hash = ethereum_types::H256;

/// Unix timestamp in seconds, as carried by a block header
pub type Timestamp = u64;

/// Keccak-256 digest of `data`
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    Hash::from(out)
}

/// Address of a contract created by `sender` at `nonce`.
///
/// Same derivation as an EVM `CREATE`: the low 20 bytes of
/// `keccak256(rlp([sender, nonce]))`.
pub fn contract_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender);
    stream.append(&nonce);
    let hash = keccak256(&stream.out());
    Address::from_slice(&hash.as_bytes()[12..])
}
