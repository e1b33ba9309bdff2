use std::fs;

use ledger_core::{ChainConfig, ChainStore};
use ledger_storage::{open_chain, SledStore};
use tempfile::{tempdir, TempDir};

pub const TEST_DIFFICULTY: u32 = 8;

pub fn test_config() -> ChainConfig {
    ChainConfig::with_difficulty(TEST_DIFFICULTY)
}

pub fn create_temp_dir() -> (TempDir, std::path::PathBuf) {
    // Create a temporary directory for the sled database
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("chain");
    (temp_dir, db_path)
}

pub fn open_temp_chain() -> (TempDir, std::path::PathBuf, ChainStore<SledStore>) {
    let (temp_dir, db_path) = create_temp_dir();
    let chain = open_chain(&db_path, test_config()).expect("Failed to open chain");
    (temp_dir, db_path, chain)
}

pub fn remove_temp_dir(temp_dir: TempDir) {
    let dir = temp_dir.path().to_path_buf();
    temp_dir.close().expect("Failed to delete temp dir");
    let _ = fs::remove_dir_all(&dir);
    // Verify the directory is removed
    assert!(!dir.exists(), "Database directory should be removed");
}
