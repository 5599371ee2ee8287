//! Transaction id type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A transaction id: the hex-encoded SHA-256 content hash of the
/// transaction's inputs, outputs, and timestamp.
///
/// Coinbase inputs carry an empty id since they reference no prior output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(String);

impl TxId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The empty id used by coinbase inputs.
    pub fn none() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
