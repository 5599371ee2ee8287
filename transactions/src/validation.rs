//! Transaction, coinbase, and batch validation.
//!
//! Validation is stateless over a supplied unspent-output snapshot. All
//! checks are all-or-nothing: the first named failure rejects the unit as a
//! whole.

use std::collections::HashMap;

use ember_crypto::verify_signature;
use ember_types::{Amount, TxId};

use crate::error::TxError;
use crate::tx::{Transaction, TxIn, TxOut, COINBASE_AMOUNT};
use crate::utxo::{find_unspent, UnspentTxOut};

fn check_input_structure(txin: &TxIn, index: usize) -> Result<(), TxError> {
    if !txin.signature.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(TxError::Structure(format!(
            "input {index} signature is not hex"
        )));
    }
    Ok(())
}

fn check_output_structure(txout: &TxOut, index: usize) -> Result<(), TxError> {
    if !txout.address.is_valid() {
        return Err(TxError::Structure(format!(
            "output {index} address is not a valid public key"
        )));
    }
    Ok(())
}

/// Structural check of a whole transaction: id present, every input and
/// every output individually well-formed.
pub fn check_structure(tx: &Transaction) -> Result<(), TxError> {
    if tx.id.is_empty() {
        return Err(TxError::Structure("missing transaction id".into()));
    }
    for (index, txin) in tx.tx_ins.iter().enumerate() {
        check_input_structure(txin, index)?;
    }
    for (index, txout) in tx.tx_outs.iter().enumerate() {
        check_output_structure(txout, index)?;
    }
    Ok(())
}

/// Validate a non-coinbase transaction against the unspent set.
///
/// Structure, id recomputation, a signature check on **every** input, and
/// exact input/output balance (there is no fee model).
pub fn validate_transaction(tx: &Transaction, utxos: &[UnspentTxOut]) -> Result<(), TxError> {
    check_structure(tx)?;

    let expected = tx.compute_id();
    if expected != tx.id {
        return Err(TxError::IdMismatch {
            expected,
            actual: tx.id.clone(),
        });
    }

    let mut input_total = Amount::ZERO;
    for (index, txin) in tx.tx_ins.iter().enumerate() {
        let referenced =
            find_unspent(&txin.source_tx_id, txin.output_index, utxos).ok_or_else(|| {
                TxError::ReferenceNotFound {
                    tx_id: txin.source_tx_id.clone(),
                    index: txin.output_index,
                }
            })?;
        if !verify_signature(tx.id.as_str(), &txin.signature, &referenced.address) {
            return Err(TxError::SignatureInvalid { index });
        }
        input_total = input_total
            .checked_add(referenced.amount)
            .ok_or(TxError::AmountOverflow)?;
    }

    let mut output_total = Amount::ZERO;
    for txout in &tx.tx_outs {
        output_total = output_total
            .checked_add(txout.amount)
            .ok_or(TxError::AmountOverflow)?;
    }

    if input_total != output_total {
        return Err(TxError::Unbalanced {
            inputs: input_total,
            outputs: output_total,
        });
    }

    Ok(())
}

/// Validate the reward-issuing coinbase transaction of a block.
///
/// Exactly one input whose index equals the block index (coinbase inputs
/// reference no prior output), exactly one output paying the fixed reward.
pub fn validate_coinbase(tx: &Transaction, block_index: u64) -> Result<(), TxError> {
    let expected = tx.compute_id();
    if expected != tx.id {
        return Err(TxError::IdMismatch {
            expected,
            actual: tx.id.clone(),
        });
    }
    if tx.tx_ins.len() != 1 {
        return Err(TxError::Coinbase(format!(
            "expected exactly one input, got {}",
            tx.tx_ins.len()
        )));
    }
    if tx.tx_ins[0].output_index != block_index {
        return Err(TxError::Coinbase(format!(
            "input index {} does not equal block index {}",
            tx.tx_ins[0].output_index, block_index
        )));
    }
    if tx.tx_outs.len() != 1 {
        return Err(TxError::Coinbase(format!(
            "expected exactly one output, got {}",
            tx.tx_outs.len()
        )));
    }
    if tx.tx_outs[0].amount != COINBASE_AMOUNT {
        return Err(TxError::Coinbase(format!(
            "reward {} does not equal {}",
            tx.tx_outs[0].amount, COINBASE_AMOUNT
        )));
    }
    Ok(())
}

/// Find a `(source_tx_id, output_index)` key referenced by more than one
/// input across the given transactions, if any.
///
/// Detection is by grouping and counting. Callers pass the non-coinbase
/// portion of a batch; coinbase placeholder inputs reference no real output
/// and are exempt.
pub fn duplicate_spend(txs: &[Transaction]) -> Option<(TxId, u64)> {
    let mut seen: HashMap<(&TxId, u64), usize> = HashMap::new();
    for txin in txs.iter().flat_map(|tx| tx.tx_ins.iter()) {
        let count = seen.entry((&txin.source_tx_id, txin.output_index)).or_insert(0);
        *count += 1;
        if *count > 1 {
            return Some((txin.source_tx_id.clone(), txin.output_index));
        }
    }
    None
}

/// Validate a block's transaction batch.
///
/// The first element must be a valid coinbase for the block index; no two
/// inputs across the remaining transactions may spend the same output; and
/// every non-coinbase transaction must validate individually. Any failure
/// rejects the batch as a whole.
pub fn validate_batch(
    txs: &[Transaction],
    utxos: &[UnspentTxOut],
    block_index: u64,
) -> Result<(), TxError> {
    let coinbase = txs
        .first()
        .ok_or_else(|| TxError::Coinbase("batch has no coinbase transaction".into()))?;
    validate_coinbase(coinbase, block_index)?;

    let rest = &txs[1..];
    if let Some((tx_id, index)) = duplicate_spend(rest) {
        return Err(TxError::DuplicateSpend { tx_id, index });
    }

    for tx in rest {
        validate_transaction(tx, utxos)?;
    }
    Ok(())
}
