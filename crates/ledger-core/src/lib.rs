//! Core types for a single-node, append-only proof-of-work ledger.

pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
mod mine;
pub mod pow;

use sha2::{Digest, Sha256};

pub use block::HashedBlock;
pub use chain::{BlockStore, ChainIterator, ChainStore};
pub use config::ChainConfig;
pub use error::{LedgerError, Result};
pub use pow::ProofOfWork;

pub type Hash = [u8; constants::HASH_SIZE];

pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; constants::HASH_SIZE];
    out.copy_from_slice(&digest[..]);
    out
}
