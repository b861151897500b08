//! # xidauth-crypto — Signing Primitives
//!
//! Everything needed to check a delegation-contract credential offline:
//!
//! - **Keccak-256** ([`keccak`]) for typed-data hashing, address derivation
//!   and ABI selectors.
//! - **Addresses** ([`address`]) with EIP-55 checksum parsing and display.
//! - **Typed-data commitments** ([`eip712`]). Credentials become a
//!   `(header, body)` pair under a `(chain id, contract)` domain.
//! - **secp256k1** ([`ecdsa`]) signer recovery and key pairs.
//!
//! ## Crate Policy
//!
//! - Depends only on `xidauth-core` internally.
//! - No network access; chain id and contract address are inputs.
//! - Secret keys are never serialized or printed.

pub mod address;
pub mod ecdsa;
pub mod eip712;
pub mod error;
pub mod keccak;

pub use address::Address;
pub use ecdsa::{recover_digest, recover_signer, SecpKeyPair, SIGNATURE_LEN};
pub use eip712::{MessageEncoder, SignableMessage, SigningDomain};
pub use error::CryptoError;
pub use keccak::{keccak256, keccak256_concat};
