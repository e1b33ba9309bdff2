use crate::{
    block::HashedBlock,
    config::ChainConfig,
    constants::{DIFFICULTY_KEY, GENESIS_DATA, TIP_KEY},
    error::{LedgerError, Result},
    pow::ProofOfWork,
    Hash,
};
use std::{collections::HashSet, iter::FusedIterator};
use tracing::{debug, info, warn};

/// Key-value backend the chain persists into.
///
/// This lives in `ledger-core` to avoid a circular dependency; `ledger-storage`
/// provides the durable implementation.
pub trait BlockStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Apply every put in `batch`, in order, as one atomic unit.
    fn apply(&self, batch: &[(&[u8], &[u8])]) -> Result<()>;

    /// Like [`BlockStore::apply`], but a no-op returning `false` when `guard` is
    /// already present. The guard check and the writes form one atomic unit.
    fn apply_if_absent(&self, guard: &[u8], batch: &[(&[u8], &[u8])]) -> Result<bool>;

    fn flush(&self) -> Result<()>;
}

/// Append-only chain of proof-of-work sealed blocks, keyed by hash, with the
/// current head stored under [`TIP_KEY`] and the mining difficulty under
/// [`DIFFICULTY_KEY`].
pub struct ChainStore<S: BlockStore> {
    store: S,
    tip: Hash,
    config: ChainConfig,
}

impl<S: BlockStore> ChainStore<S> {
    /// Load the chain from `store`, creating the genesis block if no tip exists.
    pub fn open(store: S, config: ChainConfig) -> Result<Self> {
        config.validate()?;
        let tip = match read_tip(&store)? {
            Some(tip) => {
                info!(tip = %hex::encode(tip), "loaded existing chain");
                tip
            }
            None => init_genesis(&store, &config)?,
        };
        // Difficulty is part of every block hash; it is fixed when genesis is written.
        if let Some(stored) = read_difficulty(&store)? {
            if stored != config.difficulty_bits {
                return Err(LedgerError::DifficultyMismatch {
                    stored,
                    requested: config.difficulty_bits,
                });
            }
        }
        Ok(Self { store, tip, config })
    }

    /// Mine a block on top of the current tip and commit it.
    ///
    /// The block and the new tip are written in one batch, block first, so a
    /// failed write leaves both the backend and `self` on the previous tip.
    /// Once the batch is committed `self` follows the backend tip, even if the
    /// flush that follows fails.
    pub fn append(&mut self, data: impl Into<Vec<u8>>) -> Result<HashedBlock> {
        let block = HashedBlock::mine_with(data, self.tip.to_vec(), &self.config)?;
        let bytes = block.serialize()?;
        self.store
            .apply(&[(&block.hash[..], &bytes[..]), (TIP_KEY, &block.hash[..])])?;
        self.tip = block.hash;
        self.store.flush()?;
        info!(hash = %block.hash_hex(), bytes = block.data.len(), "appended block");
        Ok(block)
    }

    pub fn get_tip(&self) -> Hash {
        self.tip
    }

    pub fn iterator(&self) -> ChainIterator<'_, S> {
        ChainIterator {
            store: &self.store,
            cursor: self.tip.to_vec(),
            seen: HashSet::new(),
        }
    }

    pub fn get_block(&self, hash: &[u8]) -> Result<Option<HashedBlock>> {
        self.store
            .get(hash)?
            .map(|bytes| HashedBlock::deserialize(&bytes))
            .transpose()
    }

    /// Number of blocks reachable from the tip, genesis included.
    pub fn height(&self) -> Result<usize> {
        self.iterator().try_fold(0, |n, block| block.map(|_| n + 1))
    }

    /// Walk tip to genesis and re-check every seal and link.
    /// Returns the number of blocks verified.
    pub fn verify(&self) -> Result<usize> {
        let mut last: Option<HashedBlock> = None;
        let mut count = 0;
        for block in self.iterator() {
            let block = block?;
            {
                let pow = ProofOfWork::new(&block, self.config.difficulty_bits)?;
                if pow.digest(block.nonce) != block.hash {
                    return Err(invalid(&block, "hash does not match block contents"));
                }
                if !pow.validate() {
                    return Err(invalid(&block, "digest does not meet difficulty target"));
                }
            }
            count += 1;
            last = Some(block);
        }
        match last {
            Some(genesis) if genesis.data != GENESIS_DATA.as_bytes() => {
                Err(invalid(&genesis, "chain does not end in the genesis block"))
            }
            _ => Ok(count),
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Flush pending writes and release the backend.
    pub fn close(self) -> Result<()> {
        self.store.flush()
    }
}

fn read_tip<S: BlockStore>(store: &S) -> Result<Option<Hash>> {
    store
        .get(TIP_KEY)?
        .map(|bytes| {
            let tip: Hash = bytes
                .as_slice()
                .try_into()
                .map_err(|_| LedgerError::CorruptTip(bytes.len()))?;
            Ok(tip)
        })
        .transpose()
}

fn read_difficulty<S: BlockStore>(store: &S) -> Result<Option<u32>> {
    store
        .get(DIFFICULTY_KEY)?
        .map(|bytes| {
            let raw: [u8; 4] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| LedgerError::CorruptDifficulty(bytes.len()))?;
            Ok(u32::from_be_bytes(raw))
        })
        .transpose()
}

fn init_genesis<S: BlockStore>(store: &S, config: &ChainConfig) -> Result<Hash> {
    let genesis = HashedBlock::genesis(config)?;
    let bytes = genesis.serialize()?;
    let difficulty = config.difficulty_bits.to_be_bytes();
    let batch: [(&[u8], &[u8]); 3] = [
        (&genesis.hash[..], &bytes[..]),
        (DIFFICULTY_KEY, &difficulty[..]),
        (TIP_KEY, &genesis.hash[..]),
    ];
    if store.apply_if_absent(TIP_KEY, &batch)? {
        store.flush()?;
        info!(hash = %genesis.hash_hex(), "created genesis block");
        return Ok(genesis.hash);
    }
    // Another opener initialised the chain between our read and write.
    read_tip(store)?.ok_or(LedgerError::CorruptTip(0))
}

fn invalid(block: &HashedBlock, reason: &str) -> LedgerError {
    warn!(hash = %block.hash_hex(), reason, "chain verification failed");
    LedgerError::Validation {
        hash: block.hash_hex(),
        reason: reason.to_string(),
    }
}

/// Cursor walking from a fixed tip back to genesis.
///
/// The tip is captured at creation, so blocks appended afterwards are not seen.
/// A block stored under a key other than its own hash, or a hash seen twice,
/// is reported as a validation error. Any error ends the traversal.
pub struct ChainIterator<'a, S: BlockStore> {
    store: &'a S,
    cursor: Vec<u8>,
    seen: HashSet<Hash>,
}

impl<S: BlockStore> ChainIterator<'_, S> {
    /// Hash of the block `next` will return; empty once past genesis.
    pub fn cursor(&self) -> &[u8] {
        &self.cursor
    }
}

impl<S: BlockStore> Iterator for ChainIterator<'_, S> {
    type Item = Result<HashedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_empty() {
            return None;
        }
        let key = std::mem::take(&mut self.cursor);
        let bytes = match self.store.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Some(Err(LedgerError::MissingBlock(hex::encode(&key)))),
            Err(e) => return Some(Err(e)),
        };
        let block = match HashedBlock::deserialize(&bytes) {
            Ok(block) => block,
            Err(e) => return Some(Err(e)),
        };
        if block.hash[..] != key[..] {
            return Some(Err(invalid(&block, "stored under a different hash")));
        }
        if !self.seen.insert(block.hash) {
            return Some(Err(invalid(&block, "prev_hash links form a cycle")));
        }
        debug!(hash = %block.hash_hex(), "iterator step");
        self.cursor = block.prev_hash.clone();
        Some(Ok(block))
    }
}

impl<S: BlockStore> FusedIterator for ChainIterator<'_, S> {}
