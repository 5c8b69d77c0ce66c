//! Proof-of-work sealing.
//!
//! A block is sealed once the lowercase hex rendering of its digest starts with
//! `difficulty` `'0'` characters. Each hex character is one nibble, so the
//! predicate is checked by counting leading zero nibbles of the raw digest.

use crate::{
    constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY},
    error::{LedgerError, Result},
    finalize, BlockTemplate, Hash,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Number of leading `'0'` hex characters a sealed block digest must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Difficulty(u32);

impl Difficulty {
    pub const DEFAULT: Difficulty = Difficulty(DEFAULT_DIFFICULTY);

    pub fn new(leading_zeros: u32) -> Result<Self> {
        if leading_zeros > MAX_DIFFICULTY {
            return Err(LedgerError::InvalidDifficulty {
                difficulty: leading_zeros,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(Self(leading_zeros))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_met_by(self, hash: &Hash) -> bool {
        count_leading_zero_nibbles(hash) >= self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = LedgerError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn count_leading_zero_nibbles(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 2;
        } else {
            if *b >> 4 == 0 {
                total += 1;
            }
            break;
        }
    }
    total
}

pub fn meets_difficulty(hash: &Hash, difficulty: Difficulty) -> bool {
    difficulty.is_met_by(hash)
}

/// Outcome of a nonce search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seal {
    pub proof: u64,
    pub hash: Hash,
    /// Digests computed before the search stopped.
    pub attempts: u64,
}

/// Searches for a proof satisfying `difficulty`. Implementations keep no state
/// between calls.
pub trait Miner: Send + Sync {
    fn seal(&self, candidate: &BlockTemplate, difficulty: Difficulty) -> Seal;
}

/// Candidate nonces in search order.
pub fn nonces() -> impl Iterator<Item = u64> {
    0..=u64::MAX
}

/// Template with the fields before `proof` already absorbed by the hasher,
/// so each attempt only hashes the nonce and the parent reference.
struct PreparedTemplate {
    base: Sha256,
    tail: Vec<u8>,
}

impl PreparedTemplate {
    fn new(candidate: &BlockTemplate) -> Self {
        Self {
            base: candidate.body_hasher(),
            tail: candidate.tail_bytes(),
        }
    }

    fn hash(&self, nonce: u64) -> Hash {
        let mut hasher = self.base.clone();
        hasher.update(nonce.to_le_bytes());
        hasher.update(&self.tail);
        finalize(hasher)
    }
}

/// Tries nonces 0, 1, 2, ... and stops at the first one that satisfies the difficulty.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialMiner;

impl Miner for SequentialMiner {
    fn seal(&self, candidate: &BlockTemplate, difficulty: Difficulty) -> Seal {
        debug!(index = candidate.index, %difficulty, "sequential nonce search");
        let prepared = PreparedTemplate::new(candidate);
        let (proof, hash) = nonces()
            .map(|nonce| (nonce, prepared.hash(nonce)))
            .find(|(_, hash)| difficulty.is_met_by(hash))
            .expect("nonce space exhausted (practically impossible)");
        Seal {
            proof,
            hash,
            attempts: proof.saturating_add(1),
        }
    }
}

/// Splits the nonce range across the rayon pool. Whichever worker finds a
/// satisfying nonce first wins; the result is not necessarily the smallest one.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelMiner;

impl Miner for ParallelMiner {
    fn seal(&self, candidate: &BlockTemplate, difficulty: Difficulty) -> Seal {
        debug!(
            index = candidate.index,
            %difficulty,
            threads = rayon::current_num_threads(),
            "parallel nonce search"
        );
        let prepared = PreparedTemplate::new(candidate);
        let attempts = AtomicU64::new(0);
        let (proof, hash) = (0u64..u64::MAX)
            .into_par_iter()
            .map(|nonce| {
                attempts.fetch_add(1, Ordering::Relaxed);
                (nonce, prepared.hash(nonce))
            })
            .find_any(|(_, hash)| difficulty.is_met_by(hash))
            .expect("nonce space exhausted (practically impossible)");
        Seal {
            proof,
            hash,
            attempts: attempts.into_inner(),
        }
    }
}

/// Miner selection used by configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinerStrategy {
    #[default]
    Sequential,
    Parallel,
}

impl Miner for MinerStrategy {
    fn seal(&self, candidate: &BlockTemplate, difficulty: Difficulty) -> Seal {
        match self {
            MinerStrategy::Sequential => SequentialMiner.seal(candidate, difficulty),
            MinerStrategy::Parallel => ParallelMiner.seal(candidate, difficulty),
        }
    }
}

impl FromStr for MinerStrategy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(MinerStrategy::Sequential),
            "parallel" => Ok(MinerStrategy::Parallel),
            _ => Err(LedgerError::InvalidConfig {
                key: "miner",
                value: s.to_string(),
            }),
        }
    }
}

/// Sequential search that gives up after `max_attempts` nonces. Meant for test
/// harnesses that must not spin forever on a pathological difficulty.
pub fn mine_bounded(
    candidate: &BlockTemplate,
    difficulty: Difficulty,
    max_attempts: u64,
) -> Result<Seal> {
    let prepared = PreparedTemplate::new(candidate);
    (0..max_attempts)
        .map(|nonce| (nonce, prepared.hash(nonce)))
        .find(|(_, hash)| difficulty.is_met_by(hash))
        .map(|(proof, hash)| Seal {
            proof,
            hash,
            attempts: proof.saturating_add(1),
        })
        .ok_or(LedgerError::AttemptsExhausted {
            attempts: max_attempts,
        })
}
