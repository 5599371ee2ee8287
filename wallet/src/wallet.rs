//! Spend construction: coin selection, outputs, signing.

use std::path::Path;

use ember_crypto::derive_address;
use ember_transactions::{sign_input, Transaction, TxIn, TxOut, UnspentTxOut};
use ember_types::{Address, Amount, PrivateKey, Timestamp};

use crate::error::WalletError;
use crate::keystore::load_or_create_key;

/// The node's signing identity.
pub struct Wallet {
    private_key: PrivateKey,
    address: Address,
}

impl Wallet {
    /// Open the wallet backed by the key file at `path`, creating the key
    /// on first run.
    pub fn open(path: &Path) -> Result<Self, WalletError> {
        let private_key = load_or_create_key(path)?;
        Self::from_private_key(private_key)
    }

    pub fn from_private_key(private_key: PrivateKey) -> Result<Self, WalletError> {
        let address =
            derive_address(&private_key).map_err(|e| WalletError::Keystore(e.to_string()))?;
        Ok(Self {
            private_key,
            address,
        })
    }

    /// The wallet's address: always re-derived from the private key.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Spendable balance over the given unspent snapshot.
    pub fn balance(&self, utxos: &[UnspentTxOut]) -> Amount {
        balance_of(&self.address, utxos)
    }

    /// Build a signed transaction paying `amount` to `receiver`.
    ///
    /// Candidate outputs are the wallet's own, minus any already claimed by
    /// a pending transaction. Inputs are signed against the full unfiltered
    /// snapshot so verification can resolve the original references.
    pub fn create_transaction(
        &self,
        receiver: &Address,
        amount: Amount,
        utxos: &[UnspentTxOut],
        pool: &[Transaction],
    ) -> Result<Transaction, WalletError> {
        if !receiver.is_valid() {
            return Err(WalletError::InvalidAddress(receiver.to_string()));
        }

        let mine: Vec<UnspentTxOut> = utxos
            .iter()
            .filter(|u| u.address == self.address)
            .cloned()
            .collect();
        let candidates = filter_pool_referenced(&mine, pool);
        let (selected, leftover) = select_outputs(amount, &candidates)?;

        let tx_ins: Vec<TxIn> = selected
            .iter()
            .map(|u| TxIn::unsigned(u.source_tx_id.clone(), u.output_index))
            .collect();
        let tx_outs = build_outputs(receiver, &self.address, amount, leftover);
        let timestamp = Timestamp::now();
        let id = Transaction::id_for(&tx_ins, &tx_outs, timestamp);

        let mut tx = Transaction {
            id,
            tx_ins,
            tx_outs,
            timestamp,
        };
        let signatures: Vec<String> = (0..tx.tx_ins.len())
            .map(|index| sign_input(&tx, index, &self.private_key, utxos))
            .collect::<Result<_, _>>()?;
        for (txin, signature) in tx.tx_ins.iter_mut().zip(signatures) {
            txin.signature = signature;
        }
        Ok(tx)
    }
}

/// Sum of all unspent amounts owned by `address`.
pub fn balance_of(address: &Address, utxos: &[UnspentTxOut]) -> Amount {
    utxos
        .iter()
        .filter(|u| u.address == *address)
        .fold(Amount::ZERO, |total, u| {
            total.checked_add(u.amount).unwrap_or(total)
        })
}

/// Accumulate candidates in order until the running total covers `target`.
///
/// Returns the selected records and the non-negative leftover. Exhausting
/// the candidates without reaching the target is a hard failure.
pub fn select_outputs(
    target: Amount,
    candidates: &[UnspentTxOut],
) -> Result<(Vec<UnspentTxOut>, Amount), WalletError> {
    let mut total = Amount::ZERO;
    let mut selected = Vec::new();
    for candidate in candidates {
        if total >= target {
            break;
        }
        selected.push(candidate.clone());
        total = total
            .checked_add(candidate.amount)
            .ok_or(WalletError::InsufficientFunds {
                needed: target,
                available: total,
            })?;
    }
    if total >= target {
        Ok((selected, total.saturating_sub(target)))
    } else {
        Err(WalletError::InsufficientFunds {
            needed: target,
            available: total,
        })
    }
}

/// Drop candidates already referenced by an input of a pending transaction.
pub fn filter_pool_referenced(
    utxos: &[UnspentTxOut],
    pool: &[Transaction],
) -> Vec<UnspentTxOut> {
    let claimed: Vec<(&ember_types::TxId, u64)> = pool
        .iter()
        .flat_map(|tx| tx.tx_ins.iter())
        .map(|txin| (&txin.source_tx_id, txin.output_index))
        .collect();
    utxos
        .iter()
        .filter(|u| {
            !claimed
                .iter()
                .any(|(id, index)| **id == u.source_tx_id && *index == u.output_index)
        })
        .cloned()
        .collect()
}

/// One output to the receiver; a change output back to the spender only if
/// the leftover is non-zero.
fn build_outputs(
    receiver: &Address,
    own_address: &Address,
    amount: Amount,
    leftover: Amount,
) -> Vec<TxOut> {
    let mut outs = vec![TxOut::new(receiver.clone(), amount)];
    if !leftover.is_zero() {
        outs.push(TxOut::new(own_address.clone(), leftover));
    }
    outs
}
