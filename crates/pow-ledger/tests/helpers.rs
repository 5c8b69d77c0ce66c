#![allow(dead_code)]

use pow_ledger::{Difficulty, FixedClock, Ledger, SequentialMiner, Transaction};
use rand::{rngs::StdRng, Rng};
use tracing_subscriber::EnvFilter;

pub const GENESIS_TIME: u64 = 1_700_000_000;

pub fn init_tracing() {
    // Several tests race to install the subscriber; only the first one wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn difficulty(d: u32) -> Difficulty {
    Difficulty::new(d).expect("difficulty in range")
}

pub fn fixed_ledger(d: u32) -> Ledger<SequentialMiner, FixedClock> {
    Ledger::with_parts(difficulty(d), SequentialMiner, FixedClock(GENESIS_TIME))
}

pub fn random_batch(rng: &mut StdRng, max_len: usize) -> Vec<Transaction> {
    let len = rng.gen_range(0..=max_len);
    (0..len)
        .map(|i| Transaction {
            sender: format!("user-{}", rng.gen_range(0..10)),
            recipient: format!("user-{i}"),
            amount: rng.gen_range(1..1_000),
        })
        .collect()
}
