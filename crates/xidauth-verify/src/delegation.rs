//! # Delegation-Contract Resolver
//!
//! Verifies credentials signed for the `delegation-contract` protocol: the
//! password carries a secp256k1 signature over the typed-data commitment
//! of the credential, and the recovered signer must be authorized for the
//! name on-chain.
//!
//! ## Decision Procedure
//!
//! Each step is terminal on failure; the first failing step decides.
//!
//! 1. Protocol is not `delegation-contract` → `invalid-data`.
//! 2. Expiry lies in the past → `expired`.
//! 3. No token exists for `("p", name)` → `invalid-data`.
//! 4. No signer can be recovered from the signature → `invalid-signature`.
//! 5. The signer is authorized if any of these holds:
//!    - `hasAccess("p", name, ["g", "id", "xidauth", app], signer, now)`;
//!    - `getApproved(token) == signer`;
//!    - `isApprovedForAll(ownerOf(token), signer)`.
//!
//!    Otherwise → `invalid-signature`.
//! 6. `valid`.
//!
//! Owners are not checked separately: the delegation contract grants them
//! access to every path of their own names.
//!
//! ## Security Invariant
//!
//! Oracle failures are returned as [`TransportError`], never as a denial
//! and never as a grant.

use std::sync::Arc;

use tracing::Span;
use xidauth_core::{AuthState, Credentials, Decision, Protocol};
use xidauth_crypto::{recover_signer, Address, MessageEncoder, SigningDomain};

use crate::error::TransportError;
use crate::oracle::{access_path, DelegationOracle, PLAYER_NAMESPACE};

/// Resolves delegation-contract credentials against a [`DelegationOracle`].
///
/// Holds no mutable state; one verifier may serve concurrent requests.
pub struct DelegationVerifier {
    oracle: Arc<dyn DelegationOracle>,
    encoder: MessageEncoder,
    span: Span,
}

impl std::fmt::Debug for DelegationVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelegationVerifier")
            .field("oracle", &self.oracle.oracle_name())
            .field("domain", self.encoder.domain())
            .finish()
    }
}

impl DelegationVerifier {
    /// Create a verifier for a known signing domain.
    pub fn new(oracle: Arc<dyn DelegationOracle>, domain: SigningDomain, span: Span) -> Self {
        Self {
            oracle,
            encoder: MessageEncoder::new(domain),
            span,
        }
    }

    /// Create a verifier, reading the signing domain from the oracle.
    pub fn connect(oracle: Arc<dyn DelegationOracle>, span: Span) -> Result<Self, TransportError> {
        let domain = oracle.signing_domain()?;
        tracing::info!(
            parent: &span,
            chain_id = domain.chain_id,
            contract = %domain.verifying_contract,
            oracle = oracle.oracle_name(),
            "connected to delegation contract"
        );
        Ok(Self::new(oracle, domain, span))
    }

    /// The signing domain credentials are checked under.
    pub fn domain(&self) -> &SigningDomain {
        self.encoder.domain()
    }

    /// The commitment encoder for this verifier's domain.
    pub fn encoder(&self) -> &MessageEncoder {
        &self.encoder
    }

    /// Whether `name` is a registered player name.
    pub fn is_registered(&self, name: &str) -> Result<bool, TransportError> {
        let exists = self.oracle.name_exists(PLAYER_NAMESPACE, name)?;
        tracing::debug!(parent: &self.span, name, exists, "checked name registration");
        Ok(exists)
    }

    /// Decode `password` and verify it for `name` within `app`.
    pub fn verify_password(
        &self,
        name: &str,
        app: &str,
        password: &str,
    ) -> Result<Decision, TransportError> {
        self.verify_password_at(name, app, password, chrono::Utc::now().timestamp())
    }

    /// [`verify_password`](Self::verify_password) as of `now` (unix seconds).
    pub fn verify_password_at(
        &self,
        name: &str,
        app: &str,
        password: &str,
        now: i64,
    ) -> Result<Decision, TransportError> {
        match Credentials::from_password(name, app, password) {
            Ok(cred) => self.verify_at(&cred, now),
            Err(e) => {
                tracing::debug!(parent: &self.span, name, error = %e, "malformed password");
                Ok(Decision::malformed())
            }
        }
    }

    /// Verify credentials at the current time.
    pub fn verify(&self, cred: &Credentials) -> Result<Decision, TransportError> {
        self.verify_at(cred, chrono::Utc::now().timestamp())
    }

    /// Verify credentials as of `now` (unix seconds).
    pub fn verify_at(&self, cred: &Credentials, now: i64) -> Result<Decision, TransportError> {
        let state = self.resolve(cred, now)?;
        tracing::debug!(
            parent: &self.span,
            name = cred.name(),
            app = cred.app(),
            state = %state,
            "delegation-contract decision"
        );
        Ok(Decision::for_credentials(state, cred))
    }

    fn resolve(&self, cred: &Credentials, now: i64) -> Result<AuthState, TransportError> {
        if cred.protocol() != Protocol::DelegationContract {
            tracing::debug!(
                parent: &self.span,
                protocol = %cred.protocol(),
                "unsupported signing protocol"
            );
            return Ok(AuthState::InvalidData);
        }

        if cred.is_expired_at(now) {
            return Ok(AuthState::Expired);
        }

        let token = self.oracle.token_id_for_name(PLAYER_NAMESPACE, cred.name())?;
        if !self.oracle.token_exists(&token)? {
            tracing::debug!(parent: &self.span, name = cred.name(), "name does not exist");
            return Ok(AuthState::InvalidData);
        }

        let msg = self.encoder.encode(cred);
        let signer = match recover_signer(&msg, cred.signature()) {
            Ok(signer) => signer,
            Err(e) => {
                tracing::debug!(parent: &self.span, error = %e, "signer recovery failed");
                return Ok(AuthState::InvalidSignature);
            }
        };

        if self.is_authorized(cred, &token, signer, now)? {
            Ok(AuthState::Valid)
        } else {
            tracing::debug!(
                parent: &self.span,
                signer = %signer,
                name = cred.name(),
                "signer has no permission for name"
            );
            Ok(AuthState::InvalidSignature)
        }
    }

    fn is_authorized(
        &self,
        cred: &Credentials,
        token: &crate::oracle::TokenId,
        signer: Address,
        now: i64,
    ) -> Result<bool, TransportError> {
        let path = access_path(cred.app());
        let at = u64::try_from(now).unwrap_or(0);
        if self
            .oracle
            .has_access(PLAYER_NAMESPACE, cred.name(), &path, signer, at)?
        {
            return Ok(true);
        }

        if self.oracle.get_approved(token)? == signer {
            return Ok(true);
        }

        let owner = self.oracle.owner_of(token)?;
        self.oracle.is_approved_for_all(owner, signer)
    }
}
