//! Ember wallet.
//!
//! Holds the node's signing identity and builds signed spends:
//! - key generated once and persisted as a raw hex file; the address is
//!   always re-derived from the key, never stored
//! - balance queries over the unspent set
//! - in-order coin selection with an explicit insufficient-funds failure
//! - mempool-aware filtering so two pending spends never claim the same
//!   output

pub mod error;
pub mod keystore;
pub mod wallet;

pub use error::WalletError;
pub use keystore::load_or_create_key;
pub use wallet::{balance_of, filter_pool_referenced, select_outputs, Wallet};
