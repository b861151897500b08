//! # secp256k1 Signing and Signer Recovery
//!
//! Recovers the address that produced a credential signature, and provides
//! a key pair for producing such signatures (tooling and tests).
//!
//! ## Signature Format
//!
//! 65 bytes: `r (32) || s (32) || v (1)`. The recovery id `v` is accepted
//! both in the `27/28` convention used by wallets and as raw `0/1`. Any other
//! length or recovery id is rejected, as are overflowing `r`/`s` values.
//!
//! ## Security Invariant
//!
//! - The secret key of a [`SecpKeyPair`] is never serialized, and its
//!   `Debug` output shows only the derived address.

use rand::RngCore;

use crate::address::Address;
use crate::eip712::SignableMessage;
use crate::error::CryptoError;

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// Recover the address that signed `msg`.
pub fn recover_signer(msg: &SignableMessage, signature: &[u8]) -> Result<Address, CryptoError> {
    recover_digest(&msg.digest(), signature)
}

/// Recover the address that signed a raw 32-byte digest.
pub fn recover_digest(digest: &[u8; 32], signature: &[u8]) -> Result<Address, CryptoError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(CryptoError::InvalidSignature(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            signature.len()
        )));
    }

    let sig = libsecp256k1::Signature::parse_standard_slice(&signature[..64])
        .map_err(|e| CryptoError::InvalidSignature(format!("{e:?}")))?;

    let v = match signature[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        v => {
            return Err(CryptoError::InvalidSignature(format!(
                "unsupported recovery id {v}"
            )))
        }
    };
    let rid = libsecp256k1::RecoveryId::parse(v)
        .map_err(|e| CryptoError::InvalidSignature(format!("{e:?}")))?;

    let message = libsecp256k1::Message::parse(digest);
    let public = libsecp256k1::recover(&message, &sig, &rid)
        .map_err(|e| CryptoError::InvalidSignature(format!("{e:?}")))?;

    Ok(Address::from_uncompressed_public_key(&public.serialize()))
}

/// A secp256k1 key pair.
///
/// Does not implement `Serialize` or `Clone`.
pub struct SecpKeyPair {
    secret: libsecp256k1::SecretKey,
    address: Address,
}

impl SecpKeyPair {
    /// Generate a fresh key pair from the OS random source.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            // Zero or values above the group order are rejected; retry.
            if let Ok(pair) = Self::from_bytes(&bytes) {
                return pair;
            }
        }
    }

    /// Build a key pair from a 32-byte big-endian secret.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret = libsecp256k1::SecretKey::parse(bytes)
            .map_err(|e| CryptoError::KeyError(format!("{e:?}")))?;
        let public = libsecp256k1::PublicKey::from_secret_key(&secret);
        Ok(Self {
            address: Address::from_uncompressed_public_key(&public.serialize()),
            secret,
        })
    }

    /// Build a key pair from a 64-digit hex secret, with or without `0x`.
    pub fn from_hex(hex_key: &str) -> Result<Self, CryptoError> {
        let trimmed = hex_key.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| CryptoError::KeyError(format!("secret key hex: {e}")))?;
        Self::from_bytes(&bytes)
    }

    /// The address controlled by this key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign `msg`, returning `r || s || v` with `v` in the 27/28 convention.
    pub fn sign(&self, msg: &SignableMessage) -> [u8; SIGNATURE_LEN] {
        self.sign_digest(&msg.digest())
    }

    /// Sign a raw 32-byte digest.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> [u8; SIGNATURE_LEN] {
        let message = libsecp256k1::Message::parse(digest);
        let (sig, rid) = libsecp256k1::sign(&message, &self.secret);
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&sig.serialize());
        out[64] = rid.serialize() + 27;
        out
    }
}

impl std::fmt::Debug for SecpKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecpKeyPair({})", self.address)
    }
}
