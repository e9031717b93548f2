//! Keccak-256 hashing.
//!
//! A single primitive used uniformly for leaf hashing, pair hashing, and
//! proof-path hashing.

use sha3::{Digest, Keccak256};

/// Keccak-256 output (256-bit).
pub type Hash = [u8; 32];

/// Hash a single byte slice with keccak-256.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash the concatenation of multiple byte slices.
///
/// Accepts zero or more slices; `keccak256_concat(&[])` is the hash of
/// the empty string.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
