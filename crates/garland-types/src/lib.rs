//! # Shared Types
//!
//! Byte-string vocabulary shared across the Garland crates.
//!
//! Everything that crosses the HTTP or database boundary is hex under the
//! hood: leaves, roots, proofs, addresses. This crate owns the lenient
//! `0x`-hex codec and the fixed-size [`Address`] so the other crates agree
//! on exactly one set of parsing rules.

pub mod address;
pub mod hexutil;

pub use address::{Address, ADDRESS_LEN};
pub use hexutil::{decode_hex, encode_hex, HexBytes, HexError};
