//! Identity key persistence.
//!
//! The private key lives in a single file as a raw hex string: created on
//! first run, read on every startup. No encryption, no rotation. A key file
//! that exists but cannot be read or parsed is a fatal startup condition —
//! the node cannot operate without its signing identity.

use std::fs;
use std::path::Path;

use ember_crypto::{generate_private_key, private_key_from_hex, private_key_to_hex};
use ember_types::PrivateKey;

use crate::error::WalletError;

/// Load the identity key from `path`, generating and persisting a new one
/// if the file does not exist yet.
pub fn load_or_create_key(path: &Path) -> Result<PrivateKey, WalletError> {
    if path.exists() {
        let contents = fs::read_to_string(path)
            .map_err(|e| WalletError::Keystore(format!("failed to read {}: {e}", path.display())))?;
        return private_key_from_hex(contents.trim())
            .map_err(|e| WalletError::Keystore(format!("invalid key file {}: {e}", path.display())));
    }

    let key = generate_private_key();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            WalletError::Keystore(format!("failed to create {}: {e}", parent.display()))
        })?;
    }
    fs::write(path, private_key_to_hex(&key))
        .map_err(|e| WalletError::Keystore(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "generated new wallet key");
    Ok(key)
}
