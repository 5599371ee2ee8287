//! Block type and proof-of-work.

use ember_crypto::sha256_hex_multi;
use ember_transactions::Transaction;
use ember_types::Timestamp;
use serde::{Deserialize, Serialize};

/// Target seconds between blocks.
pub const BLOCK_GENERATION_INTERVAL_SECS: u64 = 10;

/// Difficulty is re-evaluated every this many blocks.
pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 10;

/// Tolerated clock skew, in seconds, when judging block timestamps.
const TIMESTAMP_TOLERANCE_SECS: u64 = 60;

/// A mined block holding a transaction batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub hash: String,
    pub previous_hash: String,
    pub timestamp: Timestamp,
    pub data: Vec<Transaction>,
    pub difficulty: u32,
    pub nonce: u64,
}

impl Block {
    /// Recompute this block's hash from its content.
    pub fn compute_hash(&self) -> String {
        hash_for(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.data,
            self.difficulty,
            self.nonce,
        )
    }

    /// Shape check applied to peer-supplied blocks before any chain logic
    /// runs: the hash fields must look like hashes. The genesis block has an
    /// empty previous hash.
    pub fn has_valid_structure(&self) -> bool {
        let hash_ok = self.hash.len() == 64 && self.hash.chars().all(|c| c.is_ascii_hexdigit());
        let prev_ok = self.previous_hash.is_empty()
            || (self.previous_hash.len() == 64
                && self.previous_hash.chars().all(|c| c.is_ascii_hexdigit()));
        hash_ok && prev_ok
    }

    /// Whether the stored hash matches the content and satisfies the block's
    /// own difficulty claim.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash() && hash_matches_difficulty(&self.hash, self.difficulty)
    }

    /// A timestamp is acceptable if it is no more than the tolerance behind
    /// the previous block and no more than the tolerance into the future.
    pub fn has_valid_timestamp(&self, previous: &Block, now: Timestamp) -> bool {
        let prev_floor = previous.timestamp.as_secs().saturating_sub(TIMESTAMP_TOLERANCE_SECS);
        self.timestamp.as_secs() > prev_floor
            && self.timestamp.as_secs() < now.as_secs() + TIMESTAMP_TOLERANCE_SECS
    }
}

fn hash_for(
    index: u64,
    previous_hash: &str,
    timestamp: Timestamp,
    data: &[Transaction],
    difficulty: u32,
    nonce: u64,
) -> String {
    let data_json = serde_json::to_string(data).expect("transaction batch serializes to JSON");
    sha256_hex_multi(&[
        index.to_string().as_bytes(),
        previous_hash.as_bytes(),
        timestamp.as_secs().to_string().as_bytes(),
        data_json.as_bytes(),
        difficulty.to_string().as_bytes(),
        nonce.to_string().as_bytes(),
    ])
}

/// Whether a hex hash starts with `difficulty` zero bits.
pub fn hash_matches_difficulty(hash_hex: &str, difficulty: u32) -> bool {
    let mut remaining = difficulty;
    for c in hash_hex.chars() {
        if remaining == 0 {
            return true;
        }
        let Some(nibble) = c.to_digit(16) else {
            return false;
        };
        if remaining >= 4 {
            if nibble != 0 {
                return false;
            }
            remaining -= 4;
        } else {
            return nibble >> (4 - remaining) == 0;
        }
    }
    remaining == 0
}

/// Mine a block: scan nonces until the content hash satisfies the
/// difficulty.
pub fn find_block(
    index: u64,
    previous_hash: String,
    timestamp: Timestamp,
    data: Vec<Transaction>,
    difficulty: u32,
) -> Block {
    let mut nonce = 0u64;
    loop {
        let hash = hash_for(index, &previous_hash, timestamp, &data, difficulty, nonce);
        if hash_matches_difficulty(&hash, difficulty) {
            return Block {
                index,
                hash,
                previous_hash,
                timestamp,
                data,
                difficulty,
                nonce,
            };
        }
        nonce += 1;
    }
}
