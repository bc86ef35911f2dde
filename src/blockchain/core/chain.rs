use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Creation time of the genesis block (2023-01-01T00:00:00Z, unix millis).
pub const GENESIS_TIMESTAMP: u64 = 1672531200000;

/// Computes the hex-encoded SHA-256 digest of a block's content.
///
/// Numeric fields are fed as fixed-width little-endian integers and the
/// previous hash goes last, so every distinct field tuple maps to a distinct
/// input byte string.
pub fn calculate_hash(index: u64, timestamp: u64, bpm: i64, prev_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_le_bytes());
    hasher.update(timestamp.to_le_bytes());
    hasher.update(bpm.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// Serialized with snake_case keys; the capitalised `Index`/`BPM`/`PrevHash`
/// spellings are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(alias = "Index")]
    pub index: u64,
    /// Unix timestamp in milliseconds.
    #[serde(alias = "Timestamp")]
    pub timestamp: u64,
    #[serde(alias = "BPM")]
    pub bpm: i64,
    #[serde(alias = "Hash")]
    pub hash: String,
    /// Empty for the genesis block.
    #[serde(alias = "PrevHash")]
    pub prev_hash: String,
}

impl Block {
    /// The fixed first block shared by every ledger.
    pub fn genesis() -> Self {
        Block {
            index: 0,
            timestamp: GENESIS_TIMESTAMP,
            bpm: 0,
            hash: calculate_hash(0, GENESIS_TIMESTAMP, 0, ""),
            prev_hash: String::new(),
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.prev_hash.is_empty()
    }

    /// Recomputes the digest from the block's own fields.
    pub fn compute_hash(&self) -> String {
        calculate_hash(self.index, self.timestamp, self.bpm, &self.prev_hash)
    }
}

/// Builds the successor of `previous` carrying `bpm`.
///
/// The timestamp is clamped to the predecessor's so it never runs backwards
/// when the wall clock steps.
pub fn generate_block(previous: &Block, bpm: i64) -> Block {
    let now = chrono::Utc::now().timestamp_millis() as u64;
    let index = previous.index + 1;
    let timestamp = now.max(previous.timestamp);
    let prev_hash = previous.hash.clone();
    let hash = calculate_hash(index, timestamp, bpm, &prev_hash);

    Block {
        index,
        timestamp,
        bpm,
        hash,
        prev_hash,
    }
}
