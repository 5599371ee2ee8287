//! Wallet error types.

use ember_transactions::TxError;
use ember_types::Amount;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("keystore error: {0}")]
    Keystore(String),

    #[error(transparent)]
    Tx(#[from] TxError),
}
