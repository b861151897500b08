//! # Typed-Data Commitments for Credentials
//!
//! Builds the EIP-712 signable message for a [`Credentials`] value under a
//! signing domain. The result is a commitment *pair*:
//!
//! - `header` — the domain separator, a function of the domain only
//!   (`"xidauth delegation-contract"`, version `"1"`, chain id, verifying
//!   contract);
//! - `body` — the struct hash of the credential content only.
//!
//! The digest that is actually signed is
//! `keccak256(0x19 || version || header || body)` with version `0x01`.
//!
//! ## Message Type
//!
//! ```text
//! XidAuthChallenge(string name,string application,int64 expiry,ExtraData[] extra)
//! ExtraData(string key,string value)
//! ```
//!
//! An absent expiry is encoded as `-1`. Extra entries are encoded in
//! ascending key order, so insertion order never changes the body.

use xidauth_core::Credentials;

use crate::address::Address;
use crate::keccak::{keccak256, keccak256_concat};

/// Domain name bound into every header.
pub const DOMAIN_NAME: &str = "xidauth delegation-contract";
/// Domain version bound into every header.
pub const DOMAIN_VERSION: &str = "1";
/// Version byte for structured-data messages.
pub const STRUCTURED_DATA_VERSION: u8 = 0x01;

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";
const CHALLENGE_TYPE: &str = "XidAuthChallenge(string name,string application,int64 expiry,ExtraData[] extra)ExtraData(string key,string value)";
const EXTRA_TYPE: &str = "ExtraData(string key,string value)";

/// Expiry value committed to when the credential never expires.
pub const NO_EXPIRY: i64 = -1;

/// The verifying context a signature is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigningDomain {
    /// Chain id of the ledger hosting the delegation contract.
    pub chain_id: u64,
    /// Address of the delegation contract.
    pub verifying_contract: Address,
}

/// The signable commitment pair for one credential under one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignableMessage {
    pub version: u8,
    pub header: [u8; 32],
    pub body: [u8; 32],
}

impl SignableMessage {
    /// The 32-byte digest that is signed and recovered against.
    pub fn digest(&self) -> [u8; 32] {
        keccak256_concat(&[&[0x19, self.version], &self.header, &self.body])
    }
}

/// Encodes credentials for one fixed signing domain.
#[derive(Debug, Clone)]
pub struct MessageEncoder {
    domain: SigningDomain,
    separator: [u8; 32],
}

impl MessageEncoder {
    pub fn new(domain: SigningDomain) -> Self {
        Self {
            separator: domain_separator(&domain),
            domain,
        }
    }

    pub fn domain(&self) -> &SigningDomain {
        &self.domain
    }

    /// Build the commitment pair for `cred`.
    pub fn encode(&self, cred: &Credentials) -> SignableMessage {
        SignableMessage {
            version: STRUCTURED_DATA_VERSION,
            header: self.separator,
            body: challenge_hash(cred),
        }
    }
}

fn domain_separator(domain: &SigningDomain) -> [u8; 32] {
    let mut contract = [0u8; 32];
    contract[12..].copy_from_slice(domain.verifying_contract.as_bytes());

    keccak256_concat(&[
        &keccak256(DOMAIN_TYPE.as_bytes()),
        &keccak256(DOMAIN_NAME.as_bytes()),
        &keccak256(DOMAIN_VERSION.as_bytes()),
        &uint256_word(domain.chain_id),
        &contract,
    ])
}

fn challenge_hash(cred: &Credentials) -> [u8; 32] {
    let extra_type = keccak256(EXTRA_TYPE.as_bytes());

    // BTreeMap iteration is already ascending by key.
    let mut entries = Vec::with_capacity(32 * cred.extra().len());
    for (key, value) in cred.extra() {
        let entry = keccak256_concat(&[
            &extra_type,
            &keccak256(key.as_bytes()),
            &keccak256(value.as_bytes()),
        ]);
        entries.extend_from_slice(&entry);
    }

    keccak256_concat(&[
        &keccak256(CHALLENGE_TYPE.as_bytes()),
        &keccak256(cred.name().as_bytes()),
        &keccak256(cred.app().as_bytes()),
        &int256_word(cred.expiry().unwrap_or(NO_EXPIRY)),
        &keccak256(&entries),
    ])
}

fn uint256_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Two's-complement, sign-extended 256-bit word.
fn int256_word(value: i64) -> [u8; 32] {
    let mut word = if value < 0 { [0xffu8; 32] } else { [0u8; 32] };
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}
