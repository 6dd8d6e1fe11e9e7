//! Content hashing. The repository addresses everything -- blobs, rejection file
//! names, record fingerprints -- by hex SHA-256, so this module is the one place
//! that talks to `sha2` directly.

use sha2::{Digest, Sha256};
use std::fmt;

/// A hex-encoded SHA-256 digest. Always lowercase, always 64 characters.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(String);

impl Hash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Hash(hex::encode(hasher.finalize()))
    }

    /// Parses a hex string as a hash, without recomputing anything. Used when
    /// reconstructing a `Hash` from a path or a manifest entry.
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        if hex_str.len() == 64 && hex_str.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Hash(hex_str.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// The two-character shard prefix used for `attachments/<XX>/<hash>`.
    pub fn shard_prefix(&self) -> &str {
        &self.0[0..2]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "hash_tests.rs"]
mod tests;
