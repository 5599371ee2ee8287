//! secp256k1 key generation and address derivation.

use ember_types::{Address, PrivateKey};
use secp256k1::{PublicKey, Secp256k1, SecretKey};

use crate::error::CryptoError;

/// Generate a new secp256k1 private key from a secure random source.
pub fn generate_private_key() -> PrivateKey {
    let secret = SecretKey::new(&mut rand::thread_rng());
    PrivateKey(secret.secret_bytes())
}

/// Parse a private key from its hex encoding.
pub fn private_key_from_hex(s: &str) -> Result<PrivateKey, CryptoError> {
    let bytes = hex::decode(s.trim()).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    let secret =
        SecretKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    Ok(PrivateKey(secret.secret_bytes()))
}

/// Hex-encode a private key for persistence.
pub fn private_key_to_hex(key: &PrivateKey) -> String {
    hex::encode(key.as_bytes())
}

/// Derive the wallet address from a private key: the hex encoding of the
/// uncompressed public key (130 characters, `04` prefix).
pub fn derive_address(key: &PrivateKey) -> Result<Address, CryptoError> {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(key.as_bytes())
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    let public = PublicKey::from_secret_key(&secp, &secret);
    Ok(Address::new(hex::encode(public.serialize_uncompressed())))
}
