use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("storage error: {0}")]
    Storage(#[source] BoxError),

    #[error("mining failed: exhausted nonce range below {max_nonce} without finding a valid hash")]
    MiningExhausted { max_nonce: u64 },

    #[error("invalid difficulty: {0} bits (expected 0..=256)")]
    InvalidDifficulty(u32),

    #[error("block {0} is referenced by the chain but missing from storage")]
    MissingBlock(String),

    #[error("tip key holds {0} bytes, expected a 32-byte hash")]
    CorruptTip(usize),

    #[error("chain was mined at difficulty {stored} bits, opened with {requested}")]
    DifficultyMismatch { stored: u32, requested: u32 },

    #[error("difficulty key holds {0} bytes, expected 4")]
    CorruptDifficulty(usize),

    #[error("block {hash} failed validation: {reason}")]
    Validation { hash: String, reason: String },
}

impl LedgerError {
    pub fn storage<E: Into<BoxError>>(err: E) -> Self {
        LedgerError::Storage(err.into())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
