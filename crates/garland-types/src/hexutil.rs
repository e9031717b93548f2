//! Lenient `0x`-hex encoding and decoding.
//!
//! Decoding accepts an optional `0x`/`0X` prefix and odd-length input
//! (left-padded with a zero nibble). Encoding always emits lowercase with
//! a `0x` prefix.

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Hex decoding failure.
#[derive(Debug, thiserror::Error)]
#[error("invalid hex string: {0}")]
pub struct HexError(#[from] hex::FromHexError);

/// Decode a hex string leniently.
///
/// The `0x` prefix is optional and odd-length strings are left-padded
/// with a zero nibble, so `"0xf"` and `"f"` both decode to `[0x0f]`.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, HexError> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if s.len() % 2 == 1 {
        let mut padded = String::with_capacity(s.len() + 1);
        padded.push('0');
        padded.push_str(s);
        Ok(hex::decode(padded)?)
    } else {
        Ok(hex::decode(s)?)
    }
}

/// Encode bytes as lowercase `0x`-prefixed hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// A byte string that serializes as lenient `0x` hex.
///
/// Used for every JSON field that carries raw bytes: leaves, roots, and
/// proof nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    /// View the underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the underlying byte vector.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Deref for HexBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl From<&[u8]> for HexBytes {
    fn from(v: &[u8]) -> Self {
        Self(v.to_vec())
    }
}

impl fmt::Display for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_hex(&self.0))
    }
}

impl FromStr for HexBytes {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_hex(s).map(Self)
    }
}

impl Serialize for HexBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
