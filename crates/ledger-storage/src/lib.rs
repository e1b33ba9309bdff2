pub mod sled_store;

use ledger_core::{ChainConfig, ChainStore, Result};
use std::path::Path;

pub use sled_store::SledStore;

/// Open (or create) the chain stored in the sled directory at `path`.
pub fn open_chain<P: AsRef<Path>>(path: P, config: ChainConfig) -> Result<ChainStore<SledStore>> {
    ChainStore::open(SledStore::open(path)?, config)
}
