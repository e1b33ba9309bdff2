//! Hashcash-style proof of work.
//!
//! A seal is a nonce whose digest, read as a big-endian unsigned integer, is
//! strictly below `1 << (256 - difficulty_bits)`.

use crate::{
    block::HashedBlock,
    constants::{HASH_BITS, MAX_NONCE},
    error::{LedgerError, Result},
    sha256, Hash,
};
use num_bigint::BigUint;
use std::ops::Range;
use tracing::{debug, info};

const PROGRESS_INTERVAL: u64 = 1 << 20;

pub struct ProofOfWork<'a> {
    block: &'a HashedBlock,
    difficulty_bits: u32,
    target: BigUint,
}

impl<'a> ProofOfWork<'a> {
    pub fn new(block: &'a HashedBlock, difficulty_bits: u32) -> Result<Self> {
        Ok(Self {
            block,
            difficulty_bits,
            target: target_for(difficulty_bits)?,
        })
    }

    pub fn target(&self) -> &BigUint {
        &self.target
    }

    pub fn difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }

    /// Hash input for `nonce`: `prev_hash || data || timestamp || difficulty_bits || nonce`,
    /// integers big-endian.
    pub fn prepare_data(&self, nonce: u64) -> Vec<u8> {
        let block = self.block;
        let mut data = Vec::with_capacity(block.prev_hash.len() + block.data.len() + 8 + 4 + 8);
        data.extend_from_slice(&block.prev_hash);
        data.extend_from_slice(&block.data);
        data.extend_from_slice(&block.timestamp.to_be_bytes());
        data.extend_from_slice(&self.difficulty_bits.to_be_bytes());
        data.extend_from_slice(&nonce.to_be_bytes());
        data
    }

    pub fn digest(&self, nonce: u64) -> Hash {
        sha256(&self.prepare_data(nonce))
    }

    pub fn meets_target(&self, digest: &Hash) -> bool {
        BigUint::from_bytes_be(digest) < self.target
    }

    /// Sequential search from nonce 0. Returns the first accepted `(nonce, hash)`.
    pub fn mine(&self) -> Result<(u64, Hash)> {
        self.mine_range(0..MAX_NONCE)
    }

    pub(crate) fn mine_range(&self, nonces: Range<u64>) -> Result<(u64, Hash)> {
        debug!(difficulty = self.difficulty_bits, "mining block");
        let max_nonce = nonces.end;
        for nonce in nonces {
            let hash = self.digest(nonce);
            if self.meets_target(&hash) {
                info!(
                    "Mined block with nonce {} and hash {}",
                    nonce,
                    hex::encode(hash)
                );
                return Ok((nonce, hash));
            }
            if nonce > 0 && nonce % PROGRESS_INTERVAL == 0 {
                debug!(nonce, "still mining");
            }
        }
        Err(LedgerError::MiningExhausted { max_nonce })
    }

    /// Recompute the digest with the block's stored nonce and test it against the target.
    pub fn validate(&self) -> bool {
        self.meets_target(&self.digest(self.block.nonce))
    }
}

/// `1 << (256 - difficulty_bits)`.
pub fn target_for(difficulty_bits: u32) -> Result<BigUint> {
    if difficulty_bits > HASH_BITS {
        return Err(LedgerError::InvalidDifficulty(difficulty_bits));
    }
    Ok(BigUint::from(1u8) << (HASH_BITS - difficulty_bits) as usize)
}

#[cfg(test)]
pub(crate) fn count_leading_zero_bits(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}
