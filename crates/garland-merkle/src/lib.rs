//! # Merkle Engine
//!
//! Keccak-256 Merkle trees over caller-supplied byte strings, with the
//! pairing rules that make roots interoperable with on-chain verifiers:
//!
//! - leaves are hashed verbatim (`L[0][i] = keccak256(leaf_i)`) and kept
//!   in input order,
//! - parents hash the byte-lexicographically sorted concatenation of
//!   their children, so pairing is commutative,
//! - an odd trailing node is promoted unchanged to the next level, never
//!   duplicated.
//!
//! | Module | Contents |
//! |--------|----------|
//! | `hash` | keccak-256 one-shot and multi-slice helpers |
//! | `tree` | tree construction, proofs, validation |
//! | `decode` | ABI leaf → address extraction |

pub mod decode;
pub mod hash;
pub mod tree;

pub use decode::{leaf_address, packed_size};
pub use hash::{keccak256, keccak256_concat, Hash};
pub use tree::{proof_hash, validate, MerkleError, Tree};
