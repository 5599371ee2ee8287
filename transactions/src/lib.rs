//! Ember transaction model.
//!
//! The UTXO ledger core: transactions reference previously created outputs
//! by `(source tx id, output index)` and create new outputs locked to an
//! address. This crate is pure data and validation logic — no I/O, no
//! network, no persistence:
//!
//! - content-hash transaction ids and per-input ECDSA signing
//! - structural and economic validation of single transactions
//! - coinbase validation against a block index
//! - batch validation with duplicate-spend detection
//! - derivation of the next unspent-output snapshot from an accepted batch

pub mod error;
pub mod tx;
pub mod utxo;
pub mod validation;

pub use error::TxError;
pub use tx::{sign_input, Transaction, TxIn, TxOut, COINBASE_AMOUNT};
pub use utxo::{apply_batch, find_unspent, process_batch, UnspentTxOut};
pub use validation::{
    check_structure, duplicate_spend, validate_batch, validate_coinbase, validate_transaction,
};
