use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("difficulty {difficulty} is out of range (max {max} leading hex zeros)")]
    InvalidDifficulty { difficulty: u32, max: u32 },

    #[error("no satisfying nonce found after {attempts} attempts")]
    AttemptsExhausted { attempts: u64 },

    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    #[error("failed to parse ledger config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
