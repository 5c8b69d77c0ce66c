pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Leading hex zeros required when nothing else is configured.
pub const DEFAULT_DIFFICULTY: u32 = 4;
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const ENV_DIFFICULTY: &str = "POW_LEDGER_DIFFICULTY";
pub const ENV_MINER: &str = "POW_LEDGER_MINER";
