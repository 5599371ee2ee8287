//! Ledger error types.

use ember_transactions::TxError;
use ember_types::TxId;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Tx(#[from] TxError),

    #[error("invalid block: {0}")]
    InvalidBlock(String),

    #[error("output {tx_id}:{index} is already claimed by a pending transaction")]
    PoolConflict { tx_id: TxId, index: u64 },
}
