//! Ledger configuration: JSON with defaults, overridable from the environment.

use crate::{
    chain::Ledger,
    constants::{DEFAULT_DIFFICULTY, ENV_DIFFICULTY, ENV_MINER},
    error::{LedgerError, Result},
    pow::{Difficulty, MinerStrategy},
};
use serde::Deserialize;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Leading `'0'` hex characters required of every mined block digest.
    pub difficulty: u32,
    pub miner: MinerStrategy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            miner: MinerStrategy::default(),
        }
    }
}

impl LedgerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults, then `POW_LEDGER_DIFFICULTY` / `POW_LEDGER_MINER` if set.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DIFFICULTY) {
            self.difficulty = value
                .trim()
                .parse()
                .map_err(|_| LedgerError::InvalidConfig {
                    key: ENV_DIFFICULTY,
                    value,
                })?;
        }
        if let Some(value) = lookup(ENV_MINER) {
            self.miner = value.parse()?;
        }
        Ok(self)
    }

    pub fn difficulty(&self) -> Result<Difficulty> {
        Difficulty::new(self.difficulty)
    }

    pub fn build(&self) -> Result<Ledger> {
        let difficulty = self.difficulty()?;
        debug!(%difficulty, miner = ?self.miner, "building ledger from config");
        Ok(Ledger::with_parts(difficulty, self.miner, Default::default()))
    }
}
