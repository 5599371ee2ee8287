//! Wallet address type.
//!
//! An address is the hex encoding of an uncompressed secp256k1 public key:
//! exactly 130 hex characters starting with the `04` point prefix. The
//! address doubles as the verification key for input signatures, so no
//! separate public-key type exists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a hex-encoded uncompressed secp256k1 public key.
const ADDRESS_LEN: usize = 130;

/// The uncompressed-point marker every address starts with.
const ADDRESS_PREFIX: &str = "04";

/// A wallet address: hex of an uncompressed secp256k1 public key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Wrap a raw string as an address. No validation is performed here;
    /// network-supplied addresses go through [`Address::is_valid`] during
    /// structural checks.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a well-formed address: 130 hex characters with the
    /// uncompressed-point `04` prefix.
    pub fn is_valid(&self) -> bool {
        self.0.len() == ADDRESS_LEN
            && self.0.chars().all(|c| c.is_ascii_hexdigit())
            && self.0.starts_with(ADDRESS_PREFIX)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}
