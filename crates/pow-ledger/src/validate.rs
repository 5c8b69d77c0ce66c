//! Chain-wide verification of parent linkage and proof-of-work.

use crate::{pow::Difficulty, Block};
use std::fmt;
use thiserror::Error;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidReason {
    /// Recorded `previous_hash` differs from the predecessor's actual digest.
    LinkageMismatch,
    /// The block's digest, using its recorded proof, misses the difficulty target.
    ProofMismatch,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::LinkageMismatch => write!(f, "previous hash mismatch"),
            InvalidReason::ProofMismatch => write!(f, "proof of work mismatch"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid {
        at_index: usize,
        reason: InvalidReason,
    },
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            ValidationResult::Valid => Ok(()),
            ValidationResult::Invalid { at_index, reason } => {
                Err(ValidationError { at_index, reason })
            }
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("block {at_index} is invalid: {reason}")]
pub struct ValidationError {
    pub at_index: usize,
    pub reason: InvalidReason,
}

#[derive(Clone, Copy, Debug)]
pub struct Validator {
    difficulty: Difficulty,
}

impl Validator {
    pub fn new(difficulty: Difficulty) -> Self {
        Self { difficulty }
    }

    /// Checks every block after genesis and reports the first offending position.
    /// Empty and genesis-only sequences are valid.
    pub fn validate(&self, blocks: &[Block]) -> ValidationResult {
        for (i, pair) in blocks.windows(2).enumerate() {
            let (prev, block) = (&pair[0], &pair[1]);
            let at_index = i + 1;

            if block.previous_hash != prev.hash_hex() {
                warn!(at_index, "previous hash does not match predecessor digest");
                return ValidationResult::Invalid {
                    at_index,
                    reason: InvalidReason::LinkageMismatch,
                };
            }

            if !self.difficulty.is_met_by(&block.hash()) {
                warn!(at_index, difficulty = %self.difficulty, "block digest misses difficulty target");
                return ValidationResult::Invalid {
                    at_index,
                    reason: InvalidReason::ProofMismatch,
                };
            }
        }
        ValidationResult::Valid
    }
}

pub fn validate_chain(blocks: &[Block], difficulty: Difficulty) -> ValidationResult {
    Validator::new(difficulty).validate(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{chain::genesis_block, pow::mine_bounded, BlockTemplate, Transaction};

    fn difficulty(d: u32) -> Difficulty {
        Difficulty::new(d).unwrap()
    }

    /// Builds a sealed chain by hand, without going through `Ledger`.
    fn mined_chain(d: u32, len: usize) -> Vec<Block> {
        let mut blocks = vec![genesis_block(1_600_000_000)];
        for i in 1..len as u64 {
            let prev = blocks.last().unwrap();
            let template = BlockTemplate::new(
                i,
                1_600_000_000 + i,
                vec![Transaction::new("A", "B", i * 10)],
                prev.hash_hex(),
            );
            let seal = mine_bounded(&template, difficulty(d), 10_000_000).unwrap();
            blocks.push(template.seal(seal.proof));
        }
        blocks
    }

    #[test]
    fn empty_and_genesis_only_are_valid() {
        assert!(validate_chain(&[], difficulty(4)).is_valid());
        assert!(validate_chain(&[genesis_block(0)], difficulty(4)).is_valid());
    }

    #[test]
    fn genesis_is_exempt_from_proof() {
        // Genesis is never mined, yet a high difficulty still validates it.
        assert!(validate_chain(&[genesis_block(123)], difficulty(64)).is_valid());
    }

    #[test]
    fn mined_chain_is_valid() {
        let blocks = mined_chain(2, 5);
        assert_eq!(validate_chain(&blocks, difficulty(2)), ValidationResult::Valid);
    }

    #[test]
    fn broken_link_is_linkage_mismatch() {
        let mut blocks = mined_chain(2, 4);
        blocks[2].previous_hash = "f".repeat(64);
        assert_eq!(
            validate_chain(&blocks, difficulty(2)),
            ValidationResult::Invalid {
                at_index: 2,
                reason: InvalidReason::LinkageMismatch
            }
        );
    }

    #[test]
    fn unsealed_block_is_proof_mismatch() {
        let mut blocks = mined_chain(2, 3);
        // Walk the proof forward until the digest misses the target.
        let d = difficulty(2);
        while d.is_met_by(&blocks[2].hash()) {
            blocks[2].proof += 1;
        }
        assert_eq!(
            validate_chain(&blocks, d),
            ValidationResult::Invalid {
                at_index: 2,
                reason: InvalidReason::ProofMismatch
            }
        );
    }

    #[test]
    fn reports_earliest_failure() {
        let mut blocks = mined_chain(1, 5);
        blocks[3].previous_hash = "bad".to_string();
        blocks[1].previous_hash = "bad".to_string();
        let result = validate_chain(&blocks, difficulty(1));
        assert_eq!(
            result,
            ValidationResult::Invalid {
                at_index: 1,
                reason: InvalidReason::LinkageMismatch
            }
        );
    }

    #[test]
    fn tampering_with_predecessor_breaks_successor_link() {
        let mut blocks = mined_chain(1, 4);
        // Block 1's own proof may still pass at difficulty 0, but block 2's
        // parent reference no longer matches.
        blocks[1].transactions[0].amount += 1;
        let result = validate_chain(&blocks, difficulty(0));
        assert_eq!(
            result,
            ValidationResult::Invalid {
                at_index: 2,
                reason: InvalidReason::LinkageMismatch
            }
        );
    }

    #[test]
    fn into_result_carries_index_and_reason() {
        assert!(ValidationResult::Valid.into_result().is_ok());
        let err = ValidationResult::Invalid {
            at_index: 7,
            reason: InvalidReason::ProofMismatch,
        }
        .into_result()
        .unwrap_err();
        assert_eq!(err.at_index, 7);
        assert_eq!(err.to_string(), "block 7 is invalid: proof of work mismatch");
    }
}
