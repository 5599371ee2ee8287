//! ECDSA message signing and verification.
//!
//! Messages are SHA-256 digested before signing. Signatures are DER-encoded
//! and hex-stringified for transport; the verification key is the address
//! itself (hex uncompressed public key).

use ember_types::{Address, PrivateKey};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

use crate::error::CryptoError;
use crate::hash::sha256_digest;

/// Sign a message with a private key, returning the hex-encoded DER
/// signature.
pub fn sign_message(message: &str, key: &PrivateKey) -> Result<String, CryptoError> {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(key.as_bytes())
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    let digest = Message::from_digest(sha256_digest(message.as_bytes()));
    let signature = secp.sign_ecdsa(&digest, &secret);
    Ok(hex::encode(signature.serialize_der()))
}

/// Verify a hex-DER signature against a message and an address.
///
/// Returns `false` for malformed signatures or addresses rather than
/// erroring; a peer-supplied blob that fails to parse is simply not a valid
/// signature.
pub fn verify_signature(message: &str, signature_hex: &str, address: &Address) -> bool {
    let Ok(key_bytes) = hex::decode(address.as_str()) else {
        return false;
    };
    let Ok(public) = PublicKey::from_slice(&key_bytes) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(signature) = Signature::from_der(&sig_bytes) else {
        return false;
    };
    let secp = Secp256k1::verification_only();
    let digest = Message::from_digest(sha256_digest(message.as_bytes()));
    secp.verify_ecdsa(&digest, &signature, &public).is_ok()
}
