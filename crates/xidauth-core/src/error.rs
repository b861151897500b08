//! # Error Types
//!
//! Errors raised by the pure codecs in this crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Name and password errors are local, recoverable rejections. Callers at
//!   the chat-server boundary collapse them to a plain "deny".
//! - Every variant carries enough context to tell apart *why* an input was
//!   rejected when it shows up in a log line.

use thiserror::Error;

/// A chat-namespace name that does not decode to any identity name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The empty string is never a chat name (the empty identity is `x-`).
    #[error("empty chat name")]
    Empty,

    /// A plain name contains a character outside `[0-9a-z]`.
    #[error("invalid character {ch:?} in simple chat name {name:?}")]
    InvalidSimpleChar {
        /// The offending chat name.
        name: String,
        /// The first character that is not allowed.
        ch: char,
    },

    /// The hex part of an `x-` name contains a non-lowercase-hex character.
    #[error("invalid hex character {ch:?} in encoded chat name {name:?}")]
    InvalidHexChar {
        /// The offending chat name.
        name: String,
        /// The first character that is not allowed.
        ch: char,
    },

    /// The hex part of an `x-` name has odd length.
    #[error("odd-length hex part in encoded chat name {0:?}")]
    OddLength(String),

    /// The hex part decodes to bytes that are not UTF-8.
    #[error("encoded chat name {0:?} is not valid UTF-8")]
    InvalidUtf8(String),

    /// The hex part decodes to a simple name, which must be written plainly.
    #[error("simple name was hex-encoded: {0:?}")]
    SimpleNameEncoded(String),
}

/// Failure to turn a password string into credential data, or back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The password is not standard base64.
    #[error("password is not valid base64: {0}")]
    Base64(String),

    /// The payload is not a valid `AuthData` protocol buffer.
    #[error("invalid AuthData payload: {0}")]
    Decode(String),

    /// The protocol field carries an unknown enum value.
    #[error("unknown signing protocol value {0}")]
    UnknownProtocol(i32),

    /// The expiry does not fit a signed unix timestamp.
    #[error("expiry {0} is out of range")]
    ExpiryOverflow(u64),

    /// Negative expiries have no wire representation.
    #[error("negative expiry {0} cannot be encoded")]
    NegativeExpiry(i64),
}
