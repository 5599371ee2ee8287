//! Unspent-output set derivation.
//!
//! The unspent set is derived state: it is never patched in place. Each
//! accepted batch produces a fresh snapshot (previous snapshot minus spent
//! records, plus the batch's new outputs).

use ember_types::{Address, Amount, TxId};
use serde::{Deserialize, Serialize};

use crate::error::TxError;
use crate::tx::Transaction;
use crate::validation::validate_batch;

/// A live unspent output, uniquely keyed by `(source_tx_id, output_index)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentTxOut {
    pub source_tx_id: TxId,
    pub output_index: u64,
    pub address: Address,
    pub amount: Amount,
}

impl UnspentTxOut {
    pub fn new(source_tx_id: TxId, output_index: u64, address: Address, amount: Amount) -> Self {
        Self {
            source_tx_id,
            output_index,
            address,
            amount,
        }
    }
}

/// Look up the unspent output with the given key, if still live.
pub fn find_unspent<'a>(
    tx_id: &TxId,
    output_index: u64,
    utxos: &'a [UnspentTxOut],
) -> Option<&'a UnspentTxOut> {
    utxos
        .iter()
        .find(|u| u.source_tx_id == *tx_id && u.output_index == output_index)
}

/// Derive the next unspent snapshot from an accepted batch.
///
/// Pure: neither argument is mutated. Every output of every transaction in
/// the batch becomes a new record (indexed by its position within its own
/// output list); every record referenced by any input is removed.
pub fn apply_batch(txs: &[Transaction], utxos: &[UnspentTxOut]) -> Vec<UnspentTxOut> {
    let created: Vec<UnspentTxOut> = txs
        .iter()
        .flat_map(|tx| {
            tx.tx_outs.iter().enumerate().map(|(index, txout)| {
                UnspentTxOut::new(
                    tx.id.clone(),
                    index as u64,
                    txout.address.clone(),
                    txout.amount,
                )
            })
        })
        .collect();

    let spent: Vec<(&TxId, u64)> = txs
        .iter()
        .flat_map(|tx| tx.tx_ins.iter())
        .map(|txin| (&txin.source_tx_id, txin.output_index))
        .collect();

    utxos
        .iter()
        .filter(|u| {
            !spent
                .iter()
                .any(|(id, index)| **id == u.source_tx_id && *index == u.output_index)
        })
        .cloned()
        .chain(created)
        .collect()
}

/// Validate a block's transaction batch and, if accepted, derive the next
/// unspent snapshot.
pub fn process_batch(
    txs: &[Transaction],
    utxos: &[UnspentTxOut],
    block_index: u64,
) -> Result<Vec<UnspentTxOut>, TxError> {
    validate_batch(txs, utxos, block_index)?;
    Ok(apply_batch(txs, utxos))
}
