//! Pending-transaction pool.
//!
//! Holds transactions accepted as valid but not yet included in a block.
//! The pool rejects a transaction whose inputs collide with one already
//! pending, so two pending spends can never claim the same output.

use ember_transactions::{find_unspent, validate_transaction, Transaction, UnspentTxOut};

use crate::error::LedgerError;

#[derive(Clone, Debug, Default)]
pub struct Mempool {
    txs: Vec<Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Validate a transaction against the current unspent set and admit it
    /// if none of its inputs is already claimed by a pending transaction.
    pub fn add(&mut self, tx: Transaction, utxos: &[UnspentTxOut]) -> Result<(), LedgerError> {
        validate_transaction(&tx, utxos)?;
        for txin in &tx.tx_ins {
            let claimed = self
                .txs
                .iter()
                .flat_map(|pending| pending.tx_ins.iter())
                .any(|p| {
                    p.source_tx_id == txin.source_tx_id && p.output_index == txin.output_index
                });
            if claimed {
                return Err(LedgerError::PoolConflict {
                    tx_id: txin.source_tx_id.clone(),
                    index: txin.output_index,
                });
            }
        }
        self.txs.push(tx);
        Ok(())
    }

    /// Drop pending transactions whose inputs no longer resolve against the
    /// given unspent snapshot. Called after every chain change.
    pub fn update(&mut self, utxos: &[UnspentTxOut]) {
        self.txs.retain(|tx| {
            tx.tx_ins
                .iter()
                .all(|txin| find_unspent(&txin.source_tx_id, txin.output_index, utxos).is_some())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_crypto::{derive_address, generate_private_key};
    use ember_transactions::{sign_input, TxIn, TxOut, UnspentTxOut};
    use ember_types::{Address, Amount, PrivateKey, Timestamp, TxId};

    fn addr(fill: char) -> Address {
        Address::new(format!("04{}", fill.to_string().repeat(128)))
    }

    fn signed_spend(
        key: &PrivateKey,
        source: &str,
        utxos: &[UnspentTxOut],
        to: Address,
        amount: u64,
    ) -> Transaction {
        let tx_ins = vec![TxIn::unsigned(TxId::new(source), 0)];
        let tx_outs = vec![TxOut::new(to, Amount::new(amount))];
        let timestamp = Timestamp::new(77);
        let id = Transaction::id_for(&tx_ins, &tx_outs, timestamp);
        let mut tx = Transaction {
            id,
            tx_ins,
            tx_outs,
            timestamp,
        };
        let sig = sign_input(&tx, 0, key, utxos).unwrap();
        tx.tx_ins[0].signature = sig;
        tx
    }

    #[test]
    fn valid_transaction_admitted() {
        let key = generate_private_key();
        let owner = derive_address(&key).unwrap();
        let utxos = vec![UnspentTxOut::new(
            TxId::new("f"),
            0,
            owner,
            Amount::new(40),
        )];
        let tx = signed_spend(&key, "f", &utxos, addr('a'), 40);

        let mut pool = Mempool::new();
        assert!(pool.add(tx, &utxos).is_ok());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn conflicting_spend_rejected() {
        let key = generate_private_key();
        let owner = derive_address(&key).unwrap();
        let utxos = vec![UnspentTxOut::new(
            TxId::new("f"),
            0,
            owner,
            Amount::new(40),
        )];
        let first = signed_spend(&key, "f", &utxos, addr('a'), 40);
        let second = signed_spend(&key, "f", &utxos, addr('b'), 40);

        let mut pool = Mempool::new();
        pool.add(first, &utxos).unwrap();
        assert!(matches!(
            pool.add(second, &utxos),
            Err(LedgerError::PoolConflict { .. })
        ));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn invalid_transaction_rejected() {
        let mut pool = Mempool::new();
        let tx = Transaction {
            id: TxId::new("bogus"),
            tx_ins: vec![],
            tx_outs: vec![],
            timestamp: Timestamp::new(0),
        };
        assert!(pool.add(tx, &[]).is_err());
        assert!(pool.is_empty());
    }

    #[test]
    fn update_drops_transactions_with_spent_inputs() {
        let key = generate_private_key();
        let owner = derive_address(&key).unwrap();
        let utxos = vec![UnspentTxOut::new(
            TxId::new("f"),
            0,
            owner,
            Amount::new(40),
        )];
        let tx = signed_spend(&key, "f", &utxos, addr('a'), 40);

        let mut pool = Mempool::new();
        pool.add(tx, &utxos).unwrap();

        // The referenced output disappears from the snapshot.
        pool.update(&[]);
        assert!(pool.is_empty());
    }
}
