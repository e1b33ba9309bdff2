use crate::{
    config::ChainConfig,
    constants::{GENESIS_DATA, HASH_SIZE},
    error::Result,
    pow::ProofOfWork,
    Hash,
};
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// One sealed ledger entry.
///
/// `hash` is the proof-of-work digest over
/// `prev_hash || data || timestamp || difficulty_bits || nonce`, so any block
/// read back from storage can be re-validated on its own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedBlock {
    pub timestamp: i64,
    /// Empty for the genesis block.
    pub prev_hash: Vec<u8>,
    pub data: Vec<u8>,
    pub nonce: u64,
    pub hash: Hash,
}

impl HashedBlock {
    /// Build and mine a block at the default difficulty.
    pub fn create(data: impl Into<Vec<u8>>, prev_hash: impl Into<Vec<u8>>) -> Result<Self> {
        Self::mine_with(data, prev_hash, &ChainConfig::default())
    }

    /// Build a block stamped with the current time and seal it under `config`.
    pub fn mine_with(
        data: impl Into<Vec<u8>>,
        prev_hash: impl Into<Vec<u8>>,
        config: &ChainConfig,
    ) -> Result<Self> {
        let mut block = Self::unsealed(unix_now(), prev_hash.into(), data.into());
        let (nonce, hash) = {
            let pow = ProofOfWork::new(&block, config.difficulty_bits)?;
            if config.parallel_mining {
                pow.mine_parallel()?
            } else {
                pow.mine()?
            }
        };
        block.nonce = nonce;
        block.hash = hash;
        Ok(block)
    }

    pub fn genesis(config: &ChainConfig) -> Result<Self> {
        Self::mine_with(GENESIS_DATA, Vec::<u8>::new(), config)
    }

    /// A candidate block with a zero nonce and no seal yet.
    pub fn unsealed(timestamp: i64, prev_hash: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            timestamp,
            prev_hash,
            data,
            nonce: 0,
            hash: [0u8; HASH_SIZE],
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.prev_hash.is_empty()
    }

    /// Re-run the proof-of-work predicate using the stored nonce.
    pub fn validate(&self, difficulty_bits: u32) -> Result<bool> {
        Ok(ProofOfWork::new(self, difficulty_bits)?.validate())
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn prev_hash_hex(&self) -> String {
        hex::encode(&self.prev_hash)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(codec().serialize(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        Ok(codec().deserialize(bytes)?)
    }
}

/// Storage encoding. Independent of the hash input layout in `ProofOfWork`.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;

    fn config() -> ChainConfig {
        ChainConfig::with_difficulty(8)
    }

    #[test]
    fn create_block_example() {
        let block = HashedBlock::create("hello", vec![7u8; 32]).unwrap();
        assert_eq!(block.data, b"hello");
        assert_eq!(block.prev_hash, vec![7u8; 32]);
        assert!(block.timestamp > 0);
        assert!(block.validate(crate::constants::DEFAULT_DIFFICULTY_BITS).unwrap());
    }

    #[test]
    fn genesis_block_example() {
        let genesis = HashedBlock::genesis(&config()).unwrap();
        assert!(genesis.is_genesis());
        assert!(genesis.prev_hash.is_empty());
        assert_eq!(genesis.data, GENESIS_DATA.as_bytes());
        assert!(genesis.validate(8).unwrap());
    }

    #[test]
    fn parallel_mined_block_validates() {
        let block = HashedBlock::mine_with("p", vec![1u8; 32], &config().parallel(true)).unwrap();
        assert!(block.validate(8).unwrap());
    }

    #[test]
    fn serialization_round_trip() {
        let block = HashedBlock::mine_with("payload", vec![9u8; 32], &config()).unwrap();
        let bytes = block.serialize().unwrap();
        assert_eq!(HashedBlock::deserialize(&bytes).unwrap(), block);
    }

    #[test]
    fn serialization_round_trip_empty_fields() {
        let block = HashedBlock::mine_with(Vec::<u8>::new(), Vec::<u8>::new(), &config()).unwrap();
        let decoded = HashedBlock::deserialize(&block.serialize().unwrap()).unwrap();
        assert!(decoded.data.is_empty());
        assert!(decoded.prev_hash.is_empty());
        assert_eq!(decoded, block);
    }

    #[test]
    fn deserialize_truncated_bytes_fails() {
        let block = HashedBlock::mine_with("truncate me", vec![3u8; 32], &config()).unwrap();
        let bytes = block.serialize().unwrap();
        for len in [0, 1, 8, bytes.len() / 2, bytes.len() - 1] {
            assert!(matches!(
                HashedBlock::deserialize(&bytes[..len]),
                Err(LedgerError::Serialization(_))
            ));
        }
    }

    #[test]
    fn deserialize_trailing_bytes_fails() {
        let block = HashedBlock::mine_with("x", Vec::<u8>::new(), &config()).unwrap();
        let mut bytes = block.serialize().unwrap();
        bytes.push(0);
        assert!(HashedBlock::deserialize(&bytes).is_err());
    }

    #[test]
    fn hex_accessors() {
        let block = HashedBlock::unsealed(1, vec![0xab, 0xcd], b"d".to_vec());
        assert_eq!(block.prev_hash_hex(), "abcd");
        assert_eq!(block.hash_hex(), "0".repeat(64));
        assert_eq!(block.hash.len(), HASH_SIZE);
    }

    #[test]
    fn invalid_difficulty_is_rejected() {
        let err = HashedBlock::mine_with("x", Vec::<u8>::new(), &ChainConfig::with_difficulty(300))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDifficulty(300)));
    }
}
