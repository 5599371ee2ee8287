use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("wallet error: {0}")]
    Wallet(#[from] ember_wallet::WalletError),

    #[error("ledger error: {0}")]
    Ledger(#[from] ember_ledger::LedgerError),

    #[error("config error: {0}")]
    Config(String),

    #[error("peer connection error: {0}")]
    Peer(String),

    #[error("mined block was rejected by the chain")]
    BlockRejected,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}
