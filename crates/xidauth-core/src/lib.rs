//! # xidauth-core — Foundational Types
//!
//! Defines the pieces of the xidauth credential protocol that need no
//! cryptography and no network access. Every other crate in the workspace
//! depends on `xidauth-core`; it depends on nothing internal.
//!
//! ## Contents
//!
//! 1. **Chat names** ([`names`]). Bidirectional, unambiguous transliteration
//!    between XMPP user names and ledger identity names.
//!
//! 2. **Credentials** ([`credentials`]). A plain value type with explicit
//!    optional fields and get/set/clear accessors.
//!
//! 3. **Passwords** ([`password`]). The `AuthData` protocol buffer,
//!    transported as standard base64.
//!
//! 4. **Decisions** ([`decision`]). The `valid | expired | invalid-signature |
//!    invalid-data | malformed | not-up-to-date` vocabulary.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `xidauth-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod credentials;
pub mod decision;
pub mod error;
pub mod names;
pub mod password;

pub use credentials::{Credentials, Protocol};
pub use decision::{AuthState, Decision};
pub use error::{NameError, PasswordError};
pub use names::{decode_chat_name, encode_identity_name, is_simple_name};
pub use password::AuthData;
