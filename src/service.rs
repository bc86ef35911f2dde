//! Boundary between request handlers and the [`Ledger`].
//!
//! Payload range checks and all logging of ledger activity live here so the
//! ledger itself stays free of side effects.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::blockchain::{is_chain_valid, validate_chain, Block, Ledger};
use crate::config::LedgerConfig;
use crate::error::{ChainError, Result};

#[derive(Debug, Clone)]
pub struct LedgerService {
    ledger: Arc<Ledger>,
    min_bpm: i64,
    max_bpm: i64,
}

impl LedgerService {
    pub fn new(ledger: Arc<Ledger>, config: &LedgerConfig) -> Self {
        Self {
            ledger,
            min_bpm: config.min_bpm,
            max_bpm: config.max_bpm,
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Validate `bpm` against the configured range and append it.
    pub fn create_block(&self, bpm: i64) -> Result<Block> {
        if bpm < self.min_bpm || bpm > self.max_bpm {
            warn!(bpm, min = self.min_bpm, max = self.max_bpm, "rejected out-of-range bpm");
            return Err(ChainError::InvalidPayload(format!(
                "BPM must be between {} and {}, got {}",
                self.min_bpm, self.max_bpm, bpm
            )));
        }

        match self.ledger.append(bpm) {
            Ok(block) => {
                info!(index = block.index, bpm = block.bpm, hash = %block.hash, "block appended");
                debug!(chain = ?self.ledger.snapshot(), "ledger after append");
                Ok(block)
            }
            Err(e) => {
                error!(bpm, error = %e, "append rejected");
                Err(e)
            }
        }
    }

    pub fn chain(&self) -> Vec<Block> {
        self.ledger.snapshot()
    }

    /// Offer a competing chain; the longer valid one wins.
    pub fn merge_chain(&self, candidate: Vec<Block>) -> bool {
        let candidate_len = candidate.len();
        let verdict = validate_chain(&candidate);

        if self.ledger.replace_if_longer(candidate) {
            info!(length = candidate_len, "ledger replaced by longer chain");
            debug!(chain = ?self.ledger.snapshot(), "ledger after replacement");
            return true;
        }

        match verdict {
            Err(e) => warn!(length = candidate_len, error = %e, "candidate chain rejected"),
            Ok(()) => debug!(
                length = candidate_len,
                current = self.ledger.len(),
                "candidate chain not longer; keeping current"
            ),
        }
        false
    }

    /// Re-check the integrity of the current chain.
    pub fn verify(&self) -> bool {
        is_chain_valid(&self.ledger.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::generate_block;

    fn service() -> LedgerService {
        LedgerService::new(Arc::new(Ledger::new()), &LedgerConfig::default())
    }

    #[test]
    fn test_create_block_appends() {
        let service = service();
        let block = service.create_block(72).unwrap();
        assert_eq!(block.index, 1);
        assert_eq!(service.chain().len(), 2);
        assert!(service.verify());
    }

    #[test]
    fn test_out_of_range_bpm_is_rejected() {
        let service = service();
        assert!(matches!(service.create_block(-1), Err(ChainError::InvalidPayload(_))));
        assert!(matches!(service.create_block(301), Err(ChainError::InvalidPayload(_))));
        assert_eq!(service.chain().len(), 1);

        assert!(service.create_block(0).is_ok());
        assert!(service.create_block(300).is_ok());
    }

    #[test]
    fn test_merge_chain_policy() {
        let service = service();
        service.create_block(70).unwrap();

        let mut candidate = vec![Block::genesis()];
        for bpm in [80, 81, 82] {
            let next = generate_block(candidate.last().unwrap(), bpm);
            candidate.push(next);
        }

        assert!(!service.merge_chain(candidate[..2].to_vec()));
        assert!(service.merge_chain(candidate.clone()));
        assert_eq!(service.chain(), candidate);

        let mut forged = candidate.clone();
        forged.push(generate_block(&candidate[3], 83));
        forged[2].bpm = 0;
        assert!(!service.merge_chain(forged));
        assert_eq!(service.chain(), candidate);
    }
}
