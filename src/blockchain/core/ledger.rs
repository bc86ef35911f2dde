use parking_lot::RwLock;

use crate::error::ChainError;

use super::chain::{generate_block, Block};
use super::validation::{is_chain_valid, validate_block};

/// The authoritative block sequence of this process.
///
/// The sequence is only reachable through the methods below. Writers hold the
/// write lock for the whole read-tail/build/validate/extend step, so two
/// appends can never build on the same tail. Readers get owned copies.
#[derive(Debug)]
pub struct Ledger {
    blocks: RwLock<Vec<Block>>,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(vec![Block::genesis()]),
        }
    }

    /// Append a block carrying `bpm` after the current tail.
    pub fn append(&self, bpm: i64) -> Result<Block, ChainError> {
        let mut blocks = self.blocks.write();
        let tail = blocks.last().ok_or_else(|| {
            ChainError::InvalidBlock("Cannot append; the ledger has no genesis block.".to_string())
        })?;

        let block = generate_block(tail, bpm);
        validate_block(&block, tail)?;

        blocks.push(block.clone());
        Ok(block)
    }

    /// Swap in `candidate` if it is valid and strictly longer than the current
    /// chain. Returns whether the swap happened.
    pub fn replace_if_longer(&self, candidate: Vec<Block>) -> bool {
        let mut blocks = self.blocks.write();
        if candidate.len() <= blocks.len() || !is_chain_valid(&candidate) {
            return false;
        }
        *blocks = candidate;
        true
    }

    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.read().clone()
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    /// Always false: the genesis block is never removed.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }

    pub fn latest(&self) -> Block {
        let blocks = self.blocks.read();
        blocks.last().cloned().unwrap_or_else(Block::genesis)
    }

    pub fn block(&self, index: u64) -> Option<Block> {
        let blocks = self.blocks.read();
        usize::try_from(index)
            .ok()
            .and_then(|i| blocks.get(i))
            .cloned()
    }

    /// Newest-first page of blocks, skipping `offset` from the tail.
    pub fn blocks_page(&self, offset: usize, limit: usize) -> Vec<Block> {
        let blocks = self.blocks.read();
        blocks.iter().rev().skip(offset).take(limit).cloned().collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
