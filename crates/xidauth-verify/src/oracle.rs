//! # Permission Oracles
//!
//! Read-only views of the external state that authorization decisions are
//! made against.
//!
//! ## Architecture
//!
//! - [`DelegationOracle`] abstracts the on-chain accounts and delegation
//!   contracts. Production deployments implement it with JSON-RPC
//!   `eth_call`s (`xidauth-rpc`); tests use
//!   [`MemoryLedger`](crate::mock::MemoryLedger).
//! - [`GspOracle`] abstracts the xid game-state processor's RPC interface.
//!
//! Both traits are synchronous and `Send + Sync` so that one oracle can be
//! shared via `Arc` between the bridge loop and the API workers. Every
//! method is a single read; retries are the caller's business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xidauth_core::Decision;
use xidauth_crypto::{Address, SigningDomain};

use crate::error::TransportError;

/// Namespace of player identities on the accounts contract.
pub const PLAYER_NAMESPACE: &str = "p";

/// Delegation path prefix under which xidauth grants live.
pub const XIDAUTH_PATH: [&str; 3] = ["g", "id", "xidauth"];

/// The delegation path that grants login rights for `app`.
pub fn access_path(app: &str) -> Vec<String> {
    XIDAUTH_PATH
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(app.to_string()))
        .collect()
}

/// ERC-721 token id of a registered identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub [u8; 32]);

impl TokenId {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Debug for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenId(0x{})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Delegation contract
// ---------------------------------------------------------------------------

/// Read access to the accounts and delegation contracts.
///
/// Implementations must be `Send + Sync` so they can be shared across
/// threads via `Arc<dyn DelegationOracle>`.
pub trait DelegationOracle: Send + Sync {
    /// Chain id and delegation-contract address signatures are bound to.
    fn signing_domain(&self) -> Result<SigningDomain, TransportError>;

    /// `accounts.exists(ns, name)`.
    fn name_exists(&self, ns: &str, name: &str) -> Result<bool, TransportError>;

    /// `accounts.tokenIdForName(ns, name)`.
    fn token_id_for_name(&self, ns: &str, name: &str) -> Result<TokenId, TransportError>;

    /// `accounts.exists(tokenId)`.
    fn token_exists(&self, token: &TokenId) -> Result<bool, TransportError>;

    /// `accounts.getApproved(tokenId)`; the zero address when unset.
    fn get_approved(&self, token: &TokenId) -> Result<Address, TransportError>;

    /// `accounts.ownerOf(tokenId)`.
    fn owner_of(&self, token: &TokenId) -> Result<Address, TransportError>;

    /// `accounts.isApprovedForAll(owner, operator)`.
    fn is_approved_for_all(&self, owner: Address, operator: Address)
        -> Result<bool, TransportError>;

    /// `delegation.hasAccess(ns, name, path, operator, atTime)`.
    fn has_access(
        &self,
        ns: &str,
        name: &str,
        path: &[String],
        operator: Address,
        at: u64,
    ) -> Result<bool, TransportError>;

    /// Human-readable name of this oracle (for logging).
    fn oracle_name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Game-state processor
// ---------------------------------------------------------------------------

/// Sync state value that marks a trustworthy game-state answer.
pub const UP_TO_DATE: &str = "up-to-date";

/// A game-state RPC result: the payload plus the processor's sync state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GspResponse<T> {
    /// Sync state, e.g. `"up-to-date"` or `"catching-up"`.
    pub state: String,
    /// Block height the answer refers to.
    #[serde(default)]
    pub height: Option<u64>,
    /// The payload.
    pub data: T,
}

/// One signer entry of a name in xid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerEntry {
    /// Application scope; absent for global signers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
    /// Signer addresses.
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// The xid state of one name, as returned by `getnamestate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameState {
    #[serde(default)]
    pub signers: Vec<SignerEntry>,
    /// Wallet addresses per currency key.
    #[serde(default)]
    pub addresses: BTreeMap<String, String>,
}

/// Read access to the xid game-state processor.
pub trait GspOracle: Send + Sync {
    /// `verifyauth {name, application, password}`.
    fn verify_auth(
        &self,
        name: &str,
        application: &str,
        password: &str,
    ) -> Result<GspResponse<Decision>, TransportError>;

    /// `getnamestate {name}`.
    fn name_state(&self, name: &str) -> Result<GspResponse<NameState>, TransportError>;

    /// Human-readable name of this oracle (for logging).
    fn oracle_name(&self) -> &str;
}
