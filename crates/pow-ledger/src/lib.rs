//! Append-only ledger sealed by proof-of-work.
//!
//! Each [`Block`] carries a batch of [`Transaction`]s and the hex digest of its
//! predecessor. A block is sealed by searching for a `proof` (nonce) whose
//! block digest starts with `difficulty` zero hex characters.

pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod pow;
pub mod validate;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use chain::{Clock, FixedClock, Ledger, MiningStats, SharedLedger, SystemClock};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use pow::{Difficulty, Miner, MinerStrategy, ParallelMiner, Seal, SequentialMiner};
pub use validate::{InvalidReason, ValidationError, ValidationResult, Validator};

pub type Hash = [u8; constants::HASH_SIZE];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        put_str(buf, &self.sender);
        put_str(buf, &self.recipient);
        put_u64(buf, self.amount);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// Canonical encoding fed to the digest. Every field takes part, `proof` included.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = body_bytes(self.index, self.timestamp, &self.transactions);
        put_u64(&mut bytes, self.proof);
        bytes.extend_from_slice(&previous_hash_bytes(&self.previous_hash));
        bytes
    }

    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.hash_bytes());
        finalize(hasher)
    }

    /// Lowercase hex digest, the form stored in `previous_hash` of the next block.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }
}

/// A block that has not been sealed yet: everything but the `proof`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockTemplate {
    pub index: u64,
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
}

impl BlockTemplate {
    pub fn new(
        index: u64,
        timestamp: u64,
        transactions: Vec<Transaction>,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            previous_hash: previous_hash.into(),
        }
    }

    /// Hasher already fed with every field preceding `proof` in the canonical encoding.
    pub(crate) fn body_hasher(&self) -> Sha256 {
        let mut hasher = Sha256::new();
        hasher.update(body_bytes(self.index, self.timestamp, &self.transactions));
        hasher
    }

    /// Encoded bytes following `proof`.
    pub(crate) fn tail_bytes(&self) -> Vec<u8> {
        previous_hash_bytes(&self.previous_hash)
    }

    /// Digest the block would have if sealed with `proof`.
    pub fn hash_with_proof(&self, proof: u64) -> Hash {
        let mut hasher = self.body_hasher();
        hasher.update(proof.to_le_bytes());
        hasher.update(self.tail_bytes());
        finalize(hasher)
    }

    pub fn seal(self, proof: u64) -> Block {
        Block {
            index: self.index,
            timestamp: self.timestamp,
            transactions: self.transactions,
            proof,
            previous_hash: self.previous_hash,
        }
    }
}

fn body_bytes(index: u64, timestamp: u64, transactions: &[Transaction]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + 8 + 8 + transactions.len() * 48);
    put_u64(&mut bytes, index);
    put_u64(&mut bytes, timestamp);
    put_u64(&mut bytes, transactions.len() as u64);
    for tx in transactions {
        tx.encode_into(&mut bytes);
    }
    bytes
}

fn previous_hash_bytes(previous_hash: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + previous_hash.len());
    put_str(&mut bytes, previous_hash);
    bytes
}

fn put_u64(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

// Length-prefixed so adjacent strings can't run into each other.
fn put_str(buf: &mut Vec<u8>, value: &str) {
    put_u64(buf, value.len() as u64);
    buf.extend_from_slice(value.as_bytes());
}

pub(crate) fn finalize(hasher: Sha256) -> Hash {
    let digest = hasher.finalize();
    let mut out = [0u8; constants::HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}
