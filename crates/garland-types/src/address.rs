//! Fixed-size 20-byte addresses.

use std::fmt;
use std::str::FromStr;

use crate::hexutil::{decode_hex, HexError};

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A 20-byte address.
///
/// Construction from arbitrary byte strings follows the usual convention:
/// longer input keeps its last 20 bytes, shorter input is left-padded
/// with zeros. Parsing is case-insensitive, so checksummed and lowercase
/// forms compare equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// Build an address from raw bytes, truncating from the left or
    /// left-padding with zeros to exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut out = [0u8; ADDRESS_LEN];
        if bytes.len() >= ADDRESS_LEN {
            out.copy_from_slice(&bytes[bytes.len() - ADDRESS_LEN..]);
        } else {
            out[ADDRESS_LEN - bytes.len()..].copy_from_slice(bytes);
        }
        Self(out)
    }

    /// View as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// True if every byte is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_hex(s)?;
        Ok(Self::from_slice(&bytes))
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(b: [u8; ADDRESS_LEN]) -> Self {
        Self(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_truncates_left() {
        let long = [0xffu8; 32];
        let addr = Address::from_slice(&long);
        assert_eq!(addr.as_bytes(), &[0xff; 20]);

        let mut word = [0u8; 32];
        word[31] = 0x07;
        let addr = Address::from_slice(&word);
        let mut want = [0u8; 20];
        want[19] = 0x07;
        assert_eq!(addr.as_bytes(), &want);
    }

    #[test]
    fn from_slice_pads_left() {
        let addr = Address::from_slice(&[0x01, 0x02]);
        let mut want = [0u8; 20];
        want[18] = 0x01;
        want[19] = 0x02;
        assert_eq!(addr.as_bytes(), &want);
    }

    #[test]
    fn parse_is_case_insensitive() {
        let lower: Address = "0x00000000000000000000000000000000000000ab".parse().unwrap();
        let upper: Address = "0x00000000000000000000000000000000000000AB".parse().unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn display_is_lowercase() {
        let addr = Address::from_slice(&[0xAB; 20]);
        assert_eq!(
            addr.to_string(),
            "0xabababababababababababababababababababab"
        );
    }
}
