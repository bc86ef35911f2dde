use crate::error::ChainError;

use super::chain::Block;

/// Checks that `candidate` is a well-formed successor of `previous`.
pub fn validate_block(candidate: &Block, previous: &Block) -> Result<(), ChainError> {
    if candidate.index != previous.index + 1 {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid block index. Expected {}, but got {}.",
            previous.index + 1,
            candidate.index
        )));
    }

    if candidate.prev_hash != previous.hash {
        return Err(ChainError::InvalidBlock(format!(
            "Invalid previous block hash. Expected {}, but got {}.",
            previous.hash, candidate.prev_hash
        )));
    }

    let expected = candidate.compute_hash();
    if expected != candidate.hash {
        return Err(ChainError::InvalidBlock(format!(
            "Block hash mismatch at index {}. Expected {}, but got {}.",
            candidate.index, expected, candidate.hash
        )));
    }

    Ok(())
}

pub fn is_block_valid(candidate: &Block, previous: &Block) -> bool {
    validate_block(candidate, previous).is_ok()
}

/// Checks a whole chain: it must start at the fixed genesis block and every
/// adjacent pair must pass [`validate_block`].
pub fn validate_chain(chain: &[Block]) -> Result<(), ChainError> {
    let first = chain
        .first()
        .ok_or_else(|| ChainError::InvalidChain("Chain is empty.".to_string()))?;

    if *first != Block::genesis() {
        return Err(ChainError::InvalidChain(
            "First block does not match the genesis block.".to_string(),
        ));
    }

    for (position, pair) in chain.windows(2).enumerate() {
        validate_block(&pair[1], &pair[0]).map_err(|e| {
            ChainError::InvalidChain(format!("Broken link at position {}: {}", position + 1, e))
        })?;
    }

    Ok(())
}

pub fn is_chain_valid(chain: &[Block]) -> bool {
    validate_chain(chain).is_ok()
}
