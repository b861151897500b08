//! # Cryptographic Errors

use thiserror::Error;

/// Error in address parsing, key handling, or signature recovery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The string is not a 0x-prefixed, 40-hex-digit address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A mixed-case address whose EIP-55 checksum does not match.
    #[error("address checksum mismatch: {0}")]
    BadChecksum(String),

    /// Signature bytes cannot be parsed or no key can be recovered from them.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Secret key is malformed or out of range.
    #[error("key error: {0}")]
    KeyError(String),
}
