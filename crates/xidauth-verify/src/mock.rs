//! # In-Memory Oracles
//!
//! Deterministic, in-process implementations of [`DelegationOracle`] and
//! [`GspOracle`] for tests, demos and the API integration suite.
//!
//! [`MemoryLedger`] models the parts of the accounts and delegation
//! contracts that authorization reads:
//!
//! - registered names with an owner and an optional single approval;
//! - operator approvals (`setApprovalForAll`);
//! - delegation grants on path prefixes, optionally expiring;
//! - owners implicitly have access to every path of their own names.
//!
//! Either oracle can be told to fail every call with a fixed
//! [`TransportError`] to exercise error propagation.

use std::collections::{BTreeMap, BTreeSet};

use parking_lot::RwLock;
use xidauth_core::{AuthState, Credentials, Decision};
use xidauth_crypto::{keccak256_concat, Address, SigningDomain};

use crate::error::TransportError;
use crate::oracle::{
    DelegationOracle, GspOracle, GspResponse, NameState, TokenId, PLAYER_NAMESPACE, UP_TO_DATE,
};

// ---------------------------------------------------------------------------
// MemoryLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Account {
    owner: Address,
    approved: Address,
}

#[derive(Debug, Clone)]
struct Grant {
    ns: String,
    name: String,
    path: Vec<String>,
    operator: Address,
    expiry: Option<u64>,
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: BTreeMap<TokenId, Account>,
    operators: BTreeSet<(Address, Address)>,
    grants: Vec<Grant>,
    failure: Option<TransportError>,
}

/// In-memory accounts and delegation contracts.
#[derive(Debug)]
pub struct MemoryLedger {
    domain: SigningDomain,
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger whose signatures are bound to `domain`.
    pub fn new(domain: SigningDomain) -> Self {
        Self {
            domain,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Deterministic token id of `(ns, name)`.
    pub fn token_id(ns: &str, name: &str) -> TokenId {
        let len = (ns.len() as u64).to_be_bytes();
        TokenId(keccak256_concat(&[&len, ns.as_bytes(), name.as_bytes()]))
    }

    /// Register a player name owned by `owner`.
    pub fn register(&self, name: &str, owner: Address) -> TokenId {
        let token = Self::token_id(PLAYER_NAMESPACE, name);
        self.state.write().accounts.insert(
            token,
            Account {
                owner,
                approved: Address::ZERO,
            },
        );
        token
    }

    /// Move a name to a new owner; clears the single-token approval.
    pub fn transfer(&self, name: &str, new_owner: Address) {
        let token = Self::token_id(PLAYER_NAMESPACE, name);
        if let Some(account) = self.state.write().accounts.get_mut(&token) {
            account.owner = new_owner;
            account.approved = Address::ZERO;
        }
    }

    /// `approve(operator, tokenId)` for a player name.
    pub fn approve(&self, name: &str, operator: Address) {
        let token = Self::token_id(PLAYER_NAMESPACE, name);
        if let Some(account) = self.state.write().accounts.get_mut(&token) {
            account.approved = operator;
        }
    }

    /// `setApprovalForAll(operator, approved)` on behalf of `owner`.
    pub fn set_approval_for_all(&self, owner: Address, operator: Address, approved: bool) {
        let mut state = self.state.write();
        if approved {
            state.operators.insert((owner, operator));
        } else {
            state.operators.remove(&(owner, operator));
        }
    }

    /// Grant `operator` access to `path` (and everything below it) on a
    /// player name, until `expiry` (unix seconds) if given.
    pub fn grant(&self, name: &str, path: &[&str], operator: Address, expiry: Option<u64>) {
        self.state.write().grants.push(Grant {
            ns: PLAYER_NAMESPACE.to_string(),
            name: name.to_string(),
            path: path.iter().map(|s| s.to_string()).collect(),
            operator,
            expiry,
        });
    }

    /// Remove every grant for `operator` on a player name.
    pub fn revoke(&self, name: &str, operator: Address) {
        self.state
            .write()
            .grants
            .retain(|g| !(g.name == name && g.operator == operator));
    }

    /// Make every subsequent call fail with `failure` (or succeed again).
    pub fn set_failure(&self, failure: Option<TransportError>) {
        self.state.write().failure = failure;
    }

    fn check_failure(&self) -> Result<(), TransportError> {
        match &self.state.read().failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

impl DelegationOracle for MemoryLedger {
    fn signing_domain(&self) -> Result<SigningDomain, TransportError> {
        self.check_failure()?;
        Ok(self.domain)
    }

    fn name_exists(&self, ns: &str, name: &str) -> Result<bool, TransportError> {
        self.check_failure()?;
        Ok(self
            .state
            .read()
            .accounts
            .contains_key(&Self::token_id(ns, name)))
    }

    fn token_id_for_name(&self, ns: &str, name: &str) -> Result<TokenId, TransportError> {
        self.check_failure()?;
        Ok(Self::token_id(ns, name))
    }

    fn token_exists(&self, token: &TokenId) -> Result<bool, TransportError> {
        self.check_failure()?;
        Ok(self.state.read().accounts.contains_key(token))
    }

    fn get_approved(&self, token: &TokenId) -> Result<Address, TransportError> {
        self.check_failure()?;
        Ok(self
            .state
            .read()
            .accounts
            .get(token)
            .map(|a| a.approved)
            .unwrap_or(Address::ZERO))
    }

    fn owner_of(&self, token: &TokenId) -> Result<Address, TransportError> {
        self.check_failure()?;
        // The real contract reverts for unknown tokens.
        self.state
            .read()
            .accounts
            .get(token)
            .map(|a| a.owner)
            .ok_or_else(|| TransportError::Rpc {
                method: "ownerOf".to_string(),
                code: 3,
                message: "execution reverted: ERC721: invalid token ID".to_string(),
            })
    }

    fn is_approved_for_all(
        &self,
        owner: Address,
        operator: Address,
    ) -> Result<bool, TransportError> {
        self.check_failure()?;
        Ok(self.state.read().operators.contains(&(owner, operator)))
    }

    fn has_access(
        &self,
        ns: &str,
        name: &str,
        path: &[String],
        operator: Address,
        at: u64,
    ) -> Result<bool, TransportError> {
        self.check_failure()?;
        let state = self.state.read();

        let token = Self::token_id(ns, name);
        if state.accounts.get(&token).is_some_and(|a| a.owner == operator) {
            return Ok(true);
        }

        Ok(state.grants.iter().any(|g| {
            g.ns == ns
                && g.name == name
                && g.operator == operator
                && path.starts_with(&g.path)
                && g.expiry.map_or(true, |e| e >= at)
        }))
    }

    fn oracle_name(&self) -> &str {
        "memory-ledger"
    }
}

// ---------------------------------------------------------------------------
// MemoryGsp
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct GspState {
    sync_state: String,
    height: u64,
    names: BTreeMap<String, NameState>,
    accepted: BTreeMap<(String, String, String), Decision>,
    failure: Option<TransportError>,
}

/// In-memory game-state processor.
///
/// `verifyauth` answers `malformed` for undecodable passwords, the decision
/// registered with [`MemoryGsp::accept`] for known triples, and
/// `invalid-signature` otherwise.
#[derive(Debug)]
pub struct MemoryGsp {
    state: RwLock<GspState>,
}

impl Default for MemoryGsp {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGsp {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GspState {
                sync_state: UP_TO_DATE.to_string(),
                height: 0,
                names: BTreeMap::new(),
                accepted: BTreeMap::new(),
                failure: None,
            }),
        }
    }

    /// Set the reported sync state and height.
    pub fn set_sync_state(&self, state: &str, height: u64) {
        let mut s = self.state.write();
        s.sync_state = state.to_string();
        s.height = height;
    }

    /// Set the state returned by `getnamestate` for `name`.
    pub fn set_name_state(&self, name: &str, state: NameState) {
        self.state.write().names.insert(name.to_string(), state);
    }

    /// Accept `password` for `name`/`application` as valid.
    pub fn accept(&self, name: &str, application: &str, password: &str) {
        let decision = match Credentials::from_password(name, application, password) {
            Ok(cred) => Decision::for_credentials(AuthState::Valid, &cred),
            Err(_) => Decision::bare(AuthState::Valid),
        };
        self.state.write().accepted.insert(
            (name.to_string(), application.to_string(), password.to_string()),
            decision,
        );
    }

    /// Make every subsequent call fail with `failure` (or succeed again).
    pub fn set_failure(&self, failure: Option<TransportError>) {
        self.state.write().failure = failure;
    }

    fn wrap<T>(state: &GspState, data: T) -> GspResponse<T> {
        GspResponse {
            state: state.sync_state.clone(),
            height: Some(state.height),
            data,
        }
    }
}

impl GspOracle for MemoryGsp {
    fn verify_auth(
        &self,
        name: &str,
        application: &str,
        password: &str,
    ) -> Result<GspResponse<Decision>, TransportError> {
        let state = self.state.read();
        if let Some(e) = &state.failure {
            return Err(e.clone());
        }

        let key = (name.to_string(), application.to_string(), password.to_string());
        let decision = match state.accepted.get(&key) {
            Some(d) => d.clone(),
            None => match Credentials::from_password(name, application, password) {
                Ok(cred) => Decision::for_credentials(AuthState::InvalidSignature, &cred),
                Err(_) => Decision::malformed(),
            },
        };
        Ok(Self::wrap(&state, decision))
    }

    fn name_state(&self, name: &str) -> Result<GspResponse<NameState>, TransportError> {
        let state = self.state.read();
        if let Some(e) = &state.failure {
            return Err(e.clone());
        }
        let data = state.names.get(name).cloned().unwrap_or_default();
        Ok(Self::wrap(&state, data))
    }

    fn oracle_name(&self) -> &str {
        "memory-gsp"
    }
}
