use ledger_core::{
    constants::BLOCKS_TREE,
    error::{LedgerError, Result},
    BlockStore,
};
use sled::{
    transaction::{TransactionError, TransactionResult},
    Db, Tree,
};
use std::path::Path;
use tracing::{debug, info};

/// Durable [`BlockStore`] over one sled tree. Block entries and the tip key
/// share the tree, so a single tree transaction covers every chain write.
#[derive(Clone)]
pub struct SledStore {
    db: Db,
    blocks: Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(LedgerError::storage)?;
        let store = Self::with_db(db)?;
        info!(path = %path.display(), recovered = store.db.was_recovered(), "sled store opened");
        Ok(store)
    }

    /// A store that is deleted when the last handle is dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(LedgerError::storage)?;
        Self::with_db(db)
    }

    fn with_db(db: Db) -> Result<Self> {
        let blocks = db.open_tree(BLOCKS_TREE).map_err(LedgerError::storage)?;
        Ok(Self { db, blocks })
    }

    /// Entries in the blocks tree, tip key included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockStore for SledStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self.blocks.get(key).map_err(LedgerError::storage)?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn apply(&self, batch: &[(&[u8], &[u8])]) -> Result<()> {
        let res: TransactionResult<(), ()> = self.blocks.transaction(|tx| {
            for (key, value) in batch {
                tx.insert(*key, *value)?;
            }
            Ok(())
        });
        debug!(puts = batch.len(), ok = res.is_ok(), "applied batch");
        res.map_err(tx_error)
    }

    fn apply_if_absent(&self, guard: &[u8], batch: &[(&[u8], &[u8])]) -> Result<bool> {
        let res: TransactionResult<bool, ()> = self.blocks.transaction(|tx| {
            if tx.get(guard)?.is_some() {
                return Ok(false);
            }
            for (key, value) in batch {
                tx.insert(*key, *value)?;
            }
            Ok(true)
        });
        res.map_err(tx_error)
    }

    fn flush(&self) -> Result<()> {
        self.db.flush().map_err(LedgerError::storage)?;
        Ok(())
    }
}

fn tx_error(err: TransactionError<()>) -> LedgerError {
    match err {
        TransactionError::Storage(e) => LedgerError::storage(e),
        TransactionError::Abort(()) => LedgerError::storage("sled transaction aborted"),
    }
}
