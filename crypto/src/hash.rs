//! SHA-256 hashing for transaction ids and block hashes.

use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 hash of arbitrary data.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    hex::encode(digest)
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha256_hex_multi(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hex::encode(hasher.finalize())
}

/// Compute the raw 32-byte SHA-256 digest of a message.
pub(crate) fn sha256_digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_deterministic() {
        let h1 = sha256_hex(b"hello ember");
        let h2 = sha256_hex(b"hello ember");
        assert_eq!(h1, h2);
    }

    #[test]
    fn sha256_different_inputs() {
        assert_ne!(sha256_hex(b"hello"), sha256_hex(b"world"));
    }

    #[test]
    fn sha256_is_64_hex_chars() {
        let h = sha256_hex(b"");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn sha256_multi_equivalent() {
        let single = sha256_hex(b"helloworld");
        let multi = sha256_hex_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }
}
