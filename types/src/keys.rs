//! Private-key container for the wallet identity.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// A 32-byte secp256k1 private key (secret scalar).
///
/// This type intentionally does not implement `Debug`, `Serialize`, or
/// `Clone` to prevent accidental exposure. Key bytes are zeroized on drop.
/// Use `ember_crypto` to generate keys and convert to/from hex.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

impl PrivateKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
