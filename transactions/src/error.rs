//! Transaction validation outcomes.
//!
//! Validation failures are enumerated values, not fatal errors: the caller
//! decides whether to reject a batch, drop a pending transaction, or ignore
//! a peer message.

use ember_crypto::CryptoError;
use ember_types::{Amount, TxId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TxError {
    #[error("malformed transaction: {0}")]
    Structure(String),

    #[error("transaction id mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: TxId, actual: TxId },

    #[error("referenced output {tx_id}:{index} not found in the unspent set")]
    ReferenceNotFound { tx_id: TxId, index: u64 },

    #[error("signing key does not own the referenced output")]
    OwnershipMismatch,

    #[error("signature for input {index} failed verification")]
    SignatureInvalid { index: usize },

    #[error("input total {inputs} does not equal output total {outputs}")]
    Unbalanced { inputs: Amount, outputs: Amount },

    #[error("amount overflow while summing transaction values")]
    AmountOverflow,

    #[error("duplicate spend of {tx_id}:{index} within the batch")]
    DuplicateSpend { tx_id: TxId, index: u64 },

    #[error("invalid coinbase: {0}")]
    Coinbase(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
