//! Content hashing for netlist fingerprints.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit XXH3 content hash.
///
/// Two netlists with the same fingerprint have the same nets, components and
/// clock annotations. Used to compare successive rebuilds of a circuit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Combines hashes in order, e.g. one per circuit of a hierarchy.
    pub fn combine<'a>(hashes: impl IntoIterator<Item = &'a ContentHash>) -> Self {
        let mut bytes = Vec::new();
        for h in hashes {
            bytes.extend_from_slice(&h.0);
        }
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = ContentHash::from_bytes(b"net 0: width 8");
        let b = ContentHash::from_bytes(b"net 0: width 8");
        assert_eq!(a, b);
        assert_ne!(a, ContentHash::from_bytes(b"net 0: width 4"));
    }

    #[test]
    fn combine_is_order_sensitive() {
        let a = ContentHash::from_bytes(b"main");
        let b = ContentHash::from_bytes(b"sub");
        assert_ne!(ContentHash::combine([&a, &b]), ContentHash::combine([&b, &a]));
        assert_eq!(ContentHash::combine([&a, &b]), ContentHash::combine([&a, &b]));
    }

    #[test]
    fn display_is_hex() {
        let s = format!("{}", ContentHash::from_bytes(b"x"));
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
