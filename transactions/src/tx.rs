//! Transaction, input, and output types.

use ember_crypto::{derive_address, sha256_hex, sign_message};
use ember_types::{Address, Amount, PrivateKey, Timestamp, TxId};
use serde::{Deserialize, Serialize};

use crate::error::TxError;
use crate::utxo::{find_unspent, UnspentTxOut};

/// Fixed reward paid by the coinbase transaction of every block.
pub const COINBASE_AMOUNT: Amount = Amount::new(50);

/// A transaction input: spends a previously created output.
///
/// The signature proves the spender controls the referenced output's
/// address. It stays empty until the owning transaction's id exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxIn {
    pub source_tx_id: TxId,
    pub output_index: u64,
    pub signature: String,
}

impl TxIn {
    /// An unsigned input referencing an unspent output.
    pub fn unsigned(source_tx_id: TxId, output_index: u64) -> Self {
        Self {
            source_tx_id,
            output_index,
            signature: String::new(),
        }
    }

    /// The placeholder input of a coinbase transaction: no prior output,
    /// the index carries the block index instead.
    pub fn coinbase(block_index: u64) -> Self {
        Self {
            source_tx_id: TxId::none(),
            output_index: block_index,
            signature: String::new(),
        }
    }
}

/// A transaction output: an amount locked to an address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub address: Address,
    pub amount: Amount,
}

impl TxOut {
    pub fn new(address: Address, amount: Amount) -> Self {
        Self { address, amount }
    }
}

/// A transaction: an ordered list of inputs consumed and outputs created.
///
/// The id is a content hash over inputs, outputs, and timestamp; any
/// mutation after signing invalidates it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub tx_ins: Vec<TxIn>,
    pub tx_outs: Vec<TxOut>,
    pub timestamp: Timestamp,
}

impl Transaction {
    /// Compute the id for a transaction body: SHA-256 over the
    /// concatenation of every input's `(source id, index)`, every output's
    /// `(address, amount)`, and the timestamp.
    pub fn id_for(tx_ins: &[TxIn], tx_outs: &[TxOut], timestamp: Timestamp) -> TxId {
        let in_content: String = tx_ins
            .iter()
            .map(|txin| format!("{}{}", txin.source_tx_id, txin.output_index))
            .collect();
        let out_content: String = tx_outs
            .iter()
            .map(|txout| format!("{}{}", txout.address, txout.amount))
            .collect();
        let payload = format!("{}{}{}", in_content, out_content, timestamp.as_secs());
        TxId::new(sha256_hex(payload.as_bytes()))
    }

    /// Recompute this transaction's id from its current content.
    pub fn compute_id(&self) -> TxId {
        Self::id_for(&self.tx_ins, &self.tx_outs, self.timestamp)
    }

    /// Build the reward-issuing coinbase transaction for a block: one
    /// placeholder input carrying the block index, one output paying the
    /// fixed reward to the beneficiary.
    pub fn coinbase(address: Address, block_index: u64, timestamp: Timestamp) -> Self {
        let tx_ins = vec![TxIn::coinbase(block_index)];
        let tx_outs = vec![TxOut::new(address, COINBASE_AMOUNT)];
        let id = Self::id_for(&tx_ins, &tx_outs, timestamp);
        Self {
            id,
            tx_ins,
            tx_outs,
            timestamp,
        }
    }
}

/// Sign one input of a transaction.
///
/// Looks up the output the input references in `utxos`, checks that the
/// key actually owns it, and signs the transaction id.
pub fn sign_input(
    tx: &Transaction,
    input_index: usize,
    key: &PrivateKey,
    utxos: &[UnspentTxOut],
) -> Result<String, TxError> {
    let txin = tx
        .tx_ins
        .get(input_index)
        .ok_or_else(|| TxError::Structure(format!("input index {input_index} out of range")))?;

    let referenced = find_unspent(&txin.source_tx_id, txin.output_index, utxos).ok_or_else(|| {
        TxError::ReferenceNotFound {
            tx_id: txin.source_tx_id.clone(),
            index: txin.output_index,
        }
    })?;

    if derive_address(key)? != referenced.address {
        return Err(TxError::OwnershipMismatch);
    }

    Ok(sign_message(tx.id.as_str(), key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_crypto::generate_private_key;

    fn addr(fill: char) -> Address {
        Address::new(format!("04{}", fill.to_string().repeat(128)))
    }

    #[test]
    fn id_depends_on_every_field() {
        let ins = vec![TxIn::unsigned(TxId::new("aa"), 0)];
        let outs = vec![TxOut::new(addr('a'), Amount::new(50))];
        let ts = Timestamp::new(1000);

        let base = Transaction::id_for(&ins, &outs, ts);
        assert_ne!(
            base,
            Transaction::id_for(&[TxIn::unsigned(TxId::new("ab"), 0)], &outs, ts)
        );
        assert_ne!(
            base,
            Transaction::id_for(&ins, &[TxOut::new(addr('a'), Amount::new(51))], ts)
        );
        assert_ne!(base, Transaction::id_for(&ins, &outs, Timestamp::new(1001)));
    }

    #[test]
    fn signature_does_not_affect_id() {
        let mut txin = TxIn::unsigned(TxId::new("aa"), 0);
        let outs = vec![TxOut::new(addr('a'), Amount::new(50))];
        let ts = Timestamp::new(1000);
        let unsigned = Transaction::id_for(std::slice::from_ref(&txin), &outs, ts);
        txin.signature = "deadbeef".into();
        let signed = Transaction::id_for(&[txin], &outs, ts);
        assert_eq!(unsigned, signed);
    }

    #[test]
    fn coinbase_has_expected_shape() {
        let tx = Transaction::coinbase(addr('b'), 7, Timestamp::new(1000));
        assert_eq!(tx.tx_ins.len(), 1);
        assert_eq!(tx.tx_ins[0].output_index, 7);
        assert!(tx.tx_ins[0].source_tx_id.is_empty());
        assert_eq!(tx.tx_outs.len(), 1);
        assert_eq!(tx.tx_outs[0].amount, COINBASE_AMOUNT);
        assert_eq!(tx.id, tx.compute_id());
    }

    #[test]
    fn transaction_round_trips_through_json() {
        let tx = Transaction::coinbase(addr('b'), 7, Timestamp::new(1000));
        let json = serde_json::to_string(&tx).unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
        assert_eq!(back.id, back.compute_id());
    }

    #[test]
    fn sign_input_unknown_reference_fails() {
        let key = generate_private_key();
        let tx = Transaction {
            id: TxId::new("id"),
            tx_ins: vec![TxIn::unsigned(TxId::new("missing"), 0)],
            tx_outs: vec![],
            timestamp: Timestamp::new(0),
        };
        let err = sign_input(&tx, 0, &key, &[]).unwrap_err();
        assert!(matches!(err, TxError::ReferenceNotFound { .. }));
    }

    #[test]
    fn sign_input_foreign_output_fails() {
        let key = generate_private_key();
        let utxos = vec![UnspentTxOut::new(
            TxId::new("src"),
            0,
            addr('c'),
            Amount::new(40),
        )];
        let tx = Transaction {
            id: TxId::new("id"),
            tx_ins: vec![TxIn::unsigned(TxId::new("src"), 0)],
            tx_outs: vec![],
            timestamp: Timestamp::new(0),
        };
        let err = sign_input(&tx, 0, &key, &utxos).unwrap_err();
        assert_eq!(err, TxError::OwnershipMismatch);
    }

    #[test]
    fn sign_input_produces_verifiable_signature() {
        let key = generate_private_key();
        let owner = ember_crypto::derive_address(&key).unwrap();
        let utxos = vec![UnspentTxOut::new(
            TxId::new("src"),
            0,
            owner.clone(),
            Amount::new(40),
        )];
        let tx = Transaction {
            id: TxId::new("the tx id"),
            tx_ins: vec![TxIn::unsigned(TxId::new("src"), 0)],
            tx_outs: vec![],
            timestamp: Timestamp::new(0),
        };
        let sig = sign_input(&tx, 0, &key, &utxos).unwrap();
        assert!(ember_crypto::verify_signature("the tx id", &sig, &owner));
    }
}
