//! Cryptographic primitives for the Ember protocol.
//!
//! - **secp256k1 ECDSA** for input signing and verification; signatures
//!   travel as hex-encoded DER
//! - **SHA-256** for transaction ids and block hashes
//! - Address derivation: the hex of the uncompressed public key *is* the
//!   address

pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use error::CryptoError;
pub use hash::{sha256_hex, sha256_hex_multi};
pub use keys::{
    derive_address, generate_private_key, private_key_from_hex, private_key_to_hex,
};
pub use sign::{sign_message, verify_signature};
