use crate::{
    constants::GENESIS_PREVIOUS_HASH,
    pow::{Difficulty, Miner, MinerStrategy},
    validate::{ValidationResult, Validator},
    Block, BlockTemplate, Hash, Transaction,
};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Source of block timestamps, in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> u64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Always reports the same instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_secs(&self) -> u64 {
        self.0
    }
}

/// A zero-transaction genesis block. It carries no proof and its parent
/// reference is a fixed sentinel.
pub fn genesis_block(timestamp: u64) -> Block {
    Block {
        index: 0,
        timestamp,
        transactions: vec![],
        proof: 0,
        previous_hash: GENESIS_PREVIOUS_HASH.to_string(),
    }
}

/// Cost of sealing one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MiningStats {
    pub hash: Hash,
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Append-only sequence of sealed blocks. Always holds at least the genesis block.
#[derive(Clone, Debug)]
pub struct Ledger<M: Miner = MinerStrategy, C: Clock = SystemClock> {
    blocks: Vec<Block>,
    difficulty: Difficulty,
    miner: M,
    clock: C,
}

impl Ledger {
    /// Ledger using the wall clock and the sequential miner.
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_parts(difficulty, MinerStrategy::Sequential, SystemClock)
    }
}

impl<M: Miner, C: Clock> Ledger<M, C> {
    pub fn with_parts(difficulty: Difficulty, miner: M, clock: C) -> Self {
        let genesis = genesis_block(clock.now_secs());
        debug!(timestamp = genesis.timestamp, %difficulty, "created genesis block");
        Self {
            blocks: vec![genesis],
            difficulty,
            miner,
            clock,
        }
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("ledger always holds its genesis block")
    }

    /// Hex digest of the tip, i.e. the parent reference the next block will carry.
    pub fn last_hash(&self) -> String {
        self.last_block().hash_hex()
    }

    /// Mines a block over `transactions` on top of the current tip and appends it.
    pub fn add_block(&mut self, transactions: Vec<Transaction>) -> Block {
        self.add_block_with_stats(transactions).0
    }

    pub fn add_block_with_stats(&mut self, transactions: Vec<Transaction>) -> (Block, MiningStats) {
        let last = self.last_block();
        let template = BlockTemplate::new(
            last.index + 1,
            self.clock.now_secs(),
            transactions,
            last.hash_hex(),
        );

        let started = Instant::now();
        let seal = self.miner.seal(&template, self.difficulty);
        let elapsed = started.elapsed();

        let block = template.seal(seal.proof);
        info!(
            index = block.index,
            proof = seal.proof,
            hash = %hex::encode(seal.hash),
            attempts = seal.attempts,
            elapsed_ms = elapsed.as_millis() as u64,
            "Mined block"
        );
        self.blocks.push(block.clone());

        let stats = MiningStats {
            hash: seal.hash,
            attempts: seal.attempts,
            elapsed,
        };
        (block, stats)
    }

    pub fn validate(&self) -> ValidationResult {
        Validator::new(self.difficulty).validate(&self.blocks)
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}

/// Cloneable handle that serializes appends behind a single-writer lock.
/// Each append depends on the tip's digest, so two writers must never mine
/// on top of the same parent.
pub struct SharedLedger<M: Miner = MinerStrategy, C: Clock = SystemClock> {
    inner: Arc<RwLock<Ledger<M, C>>>,
}

impl<M: Miner, C: Clock> Clone for SharedLedger<M, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M: Miner, C: Clock> SharedLedger<M, C> {
    pub fn new(ledger: Ledger<M, C>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    // Blocks are pushed only after a full seal, so a poisoned lock still guards
    // a consistent sequence.
    fn read(&self) -> RwLockReadGuard<'_, Ledger<M, C>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ledger<M, C>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_block(&self, transactions: Vec<Transaction>) -> Block {
        self.write().add_block(transactions)
    }

    pub fn add_block_with_stats(&self, transactions: Vec<Transaction>) -> (Block, MiningStats) {
        self.write().add_block_with_stats(transactions)
    }

    pub fn validate(&self) -> ValidationResult {
        self.read().validate()
    }

    pub fn snapshot(&self) -> Vec<Block> {
        self.read().blocks().to_vec()
    }

    pub fn last_block(&self) -> Block {
        self.read().last_block().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.read().difficulty()
    }
}
