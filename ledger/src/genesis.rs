//! Genesis block — the deterministic first block every node starts from.

use ember_transactions::Transaction;
use ember_types::{Address, Timestamp};

use crate::block::Block;

/// Fixed genesis timestamp.
const GENESIS_TIMESTAMP: Timestamp = Timestamp::new(1_704_067_200);

/// Address credited by the genesis coinbase.
const GENESIS_ADDRESS: &str = "04c0dc543dcc46f2d35132dcf85b7f5572c44a19ddda45f0d82ac4e22869d74d1e\
3e85f2ba284830aa0d18e18260f0b55a14dcbbc1a58b9b57dc0f40d0cbbd5bde";

/// The coinbase transaction embedded in the genesis block.
pub fn genesis_transaction() -> Transaction {
    Transaction::coinbase(Address::new(GENESIS_ADDRESS), 0, GENESIS_TIMESTAMP)
}

/// Build the genesis block. Deterministic: every node derives the same
/// block, so chains from different peers always share a common root.
pub fn genesis_block() -> Block {
    let mut block = Block {
        index: 0,
        hash: String::new(),
        previous_hash: String::new(),
        timestamp: GENESIS_TIMESTAMP,
        data: vec![genesis_transaction()],
        difficulty: 0,
        nonce: 0,
    };
    block.hash = block.compute_hash();
    block
}
