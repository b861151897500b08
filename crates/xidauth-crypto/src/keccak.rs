//! # Keccak-256
//!
//! The original Keccak padding used by Ethereum (not NIST SHA3-256).

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    keccak256_concat(&[data])
}

/// Keccak-256 of the concatenation of `parts`, without copying them.
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_vector() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_function_selectors() {
        let selector = |sig: &str| hex::encode(&keccak256(sig.as_bytes())[..4]);
        assert_eq!(selector("ownerOf(uint256)"), "6352211e");
        assert_eq!(selector("getApproved(uint256)"), "081812fc");
        assert_eq!(selector("isApprovedForAll(address,address)"), "e985e9c5");
        assert_eq!(selector("transfer(address,uint256)"), "a9059cbb");
    }

    #[test]
    fn test_concat_matches_single_buffer() {
        assert_eq!(
            keccak256_concat(&[b"foo", b"", b"bar"]),
            keccak256(b"foobar")
        );
    }
}
