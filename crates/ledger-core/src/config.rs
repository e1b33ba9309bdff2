use crate::constants::{DEFAULT_DIFFICULTY_BITS, HASH_BITS};
use crate::error::{LedgerError, Result};

/// Parameters shared by every block a chain mines and validates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    /// Required number of leading zero bits in a block digest.
    pub difficulty_bits: u32,
    /// Shard the nonce search across the rayon thread pool.
    pub parallel_mining: bool,
}

impl ChainConfig {
    pub fn with_difficulty(difficulty_bits: u32) -> Self {
        Self {
            difficulty_bits,
            ..Self::default()
        }
    }

    pub fn parallel(mut self, parallel_mining: bool) -> Self {
        self.parallel_mining = parallel_mining;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty_bits > HASH_BITS {
            return Err(LedgerError::InvalidDifficulty(self.difficulty_bits));
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty_bits: DEFAULT_DIFFICULTY_BITS,
            parallel_mining: false,
        }
    }
}
