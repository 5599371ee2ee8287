//! The block chain: append, fork choice, derived unspent state.

use ember_transactions::{apply_batch, process_batch, Transaction, UnspentTxOut};
use ember_types::{Timestamp, TxId};

use crate::block::{
    Block, BLOCK_GENERATION_INTERVAL_SECS, DIFFICULTY_ADJUSTMENT_INTERVAL,
};
use crate::error::LedgerError;
use crate::genesis::genesis_block;

/// The locally held chain plus the unspent-output snapshot derived from it.
#[derive(Clone, Debug)]
pub struct Chain {
    blocks: Vec<Block>,
    utxos: Vec<UnspentTxOut>,
}

impl Chain {
    /// A fresh chain holding only the genesis block.
    pub fn new() -> Self {
        let genesis = genesis_block();
        let utxos = apply_batch(&genesis.data, &[]);
        Self {
            blocks: vec![genesis],
            utxos,
        }
    }

    /// The locally newest block. The chain always holds at least genesis.
    pub fn newest_block(&self) -> &Block {
        self.blocks.last().expect("chain always holds genesis")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn utxos(&self) -> &[UnspentTxOut] {
        &self.utxos
    }

    pub fn height(&self) -> u64 {
        self.newest_block().index
    }

    pub fn find_block(&self, hash: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.hash == hash)
    }

    pub fn find_transaction(&self, id: &TxId) -> Option<&Transaction> {
        self.blocks
            .iter()
            .flat_map(|b| b.data.iter())
            .find(|tx| tx.id == *id)
    }

    /// Difficulty the next block must satisfy. Re-evaluated every
    /// [`DIFFICULTY_ADJUSTMENT_INTERVAL`] blocks against the expected
    /// generation rate; otherwise the newest block's difficulty carries
    /// over.
    pub fn next_difficulty(&self) -> u32 {
        let newest = self.newest_block();
        if newest.index % DIFFICULTY_ADJUSTMENT_INTERVAL != 0 || newest.index == 0 {
            return newest.difficulty;
        }
        let window = DIFFICULTY_ADJUSTMENT_INTERVAL as usize;
        let anchor = &self.blocks[self.blocks.len() - window];
        let expected = BLOCK_GENERATION_INTERVAL_SECS * DIFFICULTY_ADJUSTMENT_INTERVAL;
        let taken = newest
            .timestamp
            .as_secs()
            .saturating_sub(anchor.timestamp.as_secs());
        if taken < expected / 2 {
            newest.difficulty + 1
        } else if taken > expected * 2 {
            newest.difficulty.saturating_sub(1)
        } else {
            newest.difficulty
        }
    }

    /// Chain weight: `Σ 2^difficulty` over all blocks.
    pub fn cumulative_difficulty(&self) -> u128 {
        cumulative_difficulty(&self.blocks)
    }

    /// Try to append a block to the chain head. Returns `false` (and logs
    /// the reason) on rejection; the caller decides what to do with the
    /// peer that supplied it.
    pub fn add_block(&mut self, block: Block) -> bool {
        match self.check_next_block(&block) {
            Ok(next_utxos) => {
                self.blocks.push(block);
                self.utxos = next_utxos;
                true
            }
            Err(e) => {
                tracing::warn!(index = block.index, error = %e, "rejected block");
                false
            }
        }
    }

    /// Attempt a wholesale replacement of the local chain. The candidate is
    /// revalidated from genesis and accepted only if its cumulative
    /// difficulty strictly exceeds the local chain's.
    pub fn replace_chain(&mut self, candidate: Vec<Block>) -> bool {
        let replayed = match self.check_candidate_chain(&candidate) {
            Ok(utxos) => utxos,
            Err(e) => {
                tracing::warn!(error = %e, "rejected candidate chain");
                return false;
            }
        };
        if cumulative_difficulty(&candidate) <= self.cumulative_difficulty() {
            tracing::debug!(
                candidate_len = candidate.len(),
                local_len = self.blocks.len(),
                "candidate chain does not outweigh local chain"
            );
            return false;
        }
        tracing::info!(
            old_height = self.height(),
            new_height = candidate.last().map(|b| b.index).unwrap_or(0),
            "replacing local chain"
        );
        self.blocks = candidate;
        self.utxos = replayed;
        true
    }

    fn check_next_block(&self, block: &Block) -> Result<Vec<UnspentTxOut>, LedgerError> {
        validate_linkage(block, self.newest_block(), Timestamp::now())?;
        Ok(process_batch(&block.data, &self.utxos, block.index)?)
    }

    /// Validate an entire candidate chain and replay its batches from an
    /// empty unspent set, returning the resulting snapshot.
    fn check_candidate_chain(
        &self,
        candidate: &[Block],
    ) -> Result<Vec<UnspentTxOut>, LedgerError> {
        let first = candidate
            .first()
            .ok_or_else(|| LedgerError::InvalidBlock("candidate chain is empty".into()))?;
        if first.hash != self.blocks[0].hash || first.compute_hash() != first.hash {
            return Err(LedgerError::InvalidBlock(
                "candidate genesis does not match".into(),
            ));
        }

        let now = Timestamp::now();
        let mut utxos = process_batch(&first.data, &[], first.index)?;
        for pair in candidate.windows(2) {
            validate_linkage(&pair[1], &pair[0], now)?;
            utxos = process_batch(&pair[1].data, &utxos, pair[1].index)?;
        }
        Ok(utxos)
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that `block` is a valid successor of `previous`.
fn validate_linkage(block: &Block, previous: &Block, now: Timestamp) -> Result<(), LedgerError> {
    if !block.has_valid_structure() {
        return Err(LedgerError::InvalidBlock("malformed block".into()));
    }
    if block.index != previous.index + 1 {
        return Err(LedgerError::InvalidBlock(format!(
            "index {} does not follow {}",
            block.index, previous.index
        )));
    }
    if block.previous_hash != previous.hash {
        return Err(LedgerError::InvalidBlock(
            "previous hash does not match chain head".into(),
        ));
    }
    if !block.has_valid_timestamp(previous, now) {
        return Err(LedgerError::InvalidBlock("timestamp out of range".into()));
    }
    if !block.has_valid_hash() {
        return Err(LedgerError::InvalidBlock(
            "hash does not match content or difficulty".into(),
        ));
    }
    Ok(())
}

fn cumulative_difficulty(blocks: &[Block]) -> u128 {
    blocks
        .iter()
        .map(|b| 1u128.checked_shl(b.difficulty).unwrap_or(u128::MAX))
        .sum()
}
