use crate::{
    constants::MAX_NONCE,
    error::{LedgerError, Result},
    pow::ProofOfWork,
    Hash,
};
use rayon::prelude::*;
use tracing::info;

impl ProofOfWork<'_> {
    /// Searches nonces in parallel until a digest falls below the target.
    /// Any valid nonce may win; it is not necessarily the smallest one.
    pub fn mine_parallel(&self) -> Result<(u64, Hash)> {
        // Rayon splits the range across its pool; `find_any` stops the other workers on success.
        let found = (0u64..MAX_NONCE)
            .into_par_iter()
            .find_any(|nonce| self.meets_target(&self.digest(*nonce)))
            .ok_or(LedgerError::MiningExhausted {
                max_nonce: MAX_NONCE,
            })?;

        let hash = self.digest(found);
        info!(
            "Mined block with nonce {} and hash {} (parallel)",
            found,
            hex::encode(hash)
        );
        Ok((found, hash))
    }
}
