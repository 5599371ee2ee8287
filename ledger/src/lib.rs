//! Ember chain state.
//!
//! The append-only block chain and the pool of pending transactions. Blocks
//! carry a batch of transactions validated by `ember-transactions`; chain
//! acceptance (proof-of-work, linkage, fork choice by cumulative difficulty)
//! lives here. Both the chain and the unspent-output set are in-memory
//! derived state, rebuildable from the block history.

pub mod block;
pub mod chain;
pub mod error;
pub mod genesis;
pub mod mempool;

pub use block::{
    find_block, hash_matches_difficulty, Block, BLOCK_GENERATION_INTERVAL_SECS,
    DIFFICULTY_ADJUSTMENT_INTERVAL,
};
pub use chain::Chain;
pub use error::LedgerError;
pub use genesis::{genesis_block, genesis_transaction};
pub use mempool::Mempool;
