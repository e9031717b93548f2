//! Extracting the 20-byte address embedded in an ABI-encoded leaf.
//!
//! A leaf is either an address itself or an ABI-encoded tuple described
//! by an ordered list of type names (the leaf type descriptor). Two
//! encodings are supported: standard ABI (every element padded to a
//! 32-byte slot) and packed ABI (elements at their natural width).

use garland_types::{Address, ADDRESS_LEN};

/// Fixed byte width of an ABI type under packed encoding.
///
/// Returns `None` for dynamic or unrecognized types; the decoder treats
/// those as "no address available".
pub fn packed_size(ty: &str) -> Option<usize> {
    match ty {
        "address" => Some(ADDRESS_LEN),
        "bool" => Some(1),
        "uint" | "int" => Some(32),
        _ => {
            if let Some(bits) = ty.strip_prefix("uint").or_else(|| ty.strip_prefix("int")) {
                let bits: usize = bits.parse().ok()?;
                if bits == 0 || bits > 256 || bits % 8 != 0 {
                    return None;
                }
                return Some(bits / 8);
            }
            if let Some(n) = ty.strip_prefix("bytes") {
                let n: usize = n.parse().ok()?;
                if n == 0 || n > 32 {
                    return None;
                }
                return Some(n);
            }
            None
        }
    }
}

/// Extract the address embedded in `leaf` according to the leaf type
/// descriptor `ltd` and the encoding flag.
///
/// Returns `None` when the descriptor never names an address, names an
/// unknown packed type, or claims a layout the leaf is too short for.
pub fn leaf_address(leaf: &[u8], ltd: &[String], packed: bool) -> Option<Address> {
    // A bare address needs no descriptor walk.
    if ltd.is_empty() || (ltd.len() == 1 && ltd[0] == "address") {
        return Some(Address::from_slice(leaf));
    }

    // Trailing-address layouts end with the address bytes under both
    // encodings, so the last 20 bytes are the answer either way.
    if ltd.last().map(String::as_str) == Some("address") && leaf.len() > ADDRESS_LEN {
        return Some(Address::from_slice(&leaf[leaf.len() - ADDRESS_LEN..]));
    }

    if packed {
        address_packed(leaf, ltd)
    } else {
        address_unpacked(leaf, ltd)
    }
}

fn address_unpacked(leaf: &[u8], ltd: &[String]) -> Option<Address> {
    let mut cursor = 0usize;
    for desc in ltd {
        if desc == "address" {
            let end = cursor.checked_add(32)?;
            if leaf.len() >= end {
                return Some(Address::from_slice(&leaf[cursor..end]));
            }
            return None;
        }
        cursor = cursor.checked_add(32)?;
    }
    None
}

fn address_packed(leaf: &[u8], ltd: &[String]) -> Option<Address> {
    let mut cursor = 0usize;
    for desc in ltd {
        if desc == "address" {
            let end = cursor.checked_add(ADDRESS_LEN)?;
            if leaf.len() >= end {
                return Some(Address::from_slice(&leaf[cursor..end]));
            }
            return None;
        }
        cursor = cursor.checked_add(packed_size(desc)?)?;
    }
    None
}
