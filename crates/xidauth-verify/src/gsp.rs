//! # GSP Authenticator
//!
//! Delegates verification to the xid game-state processor, which knows the
//! signer keys of every name. Every GSP answer carries the processor's sync
//! state; anything other than `up-to-date` means the answer cannot be
//! trusted and is surfaced as [`VerifyError::NotUpToDate`].

use std::sync::Arc;

use tracing::Span;
use xidauth_core::Decision;

use crate::error::VerifyError;
use crate::oracle::{GspOracle, GspResponse, NameState, UP_TO_DATE};

/// Authenticates against a [`GspOracle`].
pub struct GspAuthenticator {
    oracle: Arc<dyn GspOracle>,
    span: Span,
}

impl std::fmt::Debug for GspAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GspAuthenticator")
            .field("oracle", &self.oracle.oracle_name())
            .finish()
    }
}

impl GspAuthenticator {
    pub fn new(oracle: Arc<dyn GspOracle>, span: Span) -> Self {
        Self { oracle, span }
    }

    /// Verify `password` for `name` within `app`.
    pub fn authenticate(&self, name: &str, app: &str, password: &str) -> Result<Decision, VerifyError> {
        let resp = self.oracle.verify_auth(name, app, password)?;
        let decision = self.unwrap_state(resp)?;
        tracing::debug!(
            parent: &self.span,
            name,
            app,
            state = %decision.state,
            "authentication state from xid"
        );
        Ok(decision)
    }

    /// Whether any signer could potentially authenticate `name` for `app`.
    ///
    /// True if some signer entry has at least one address and is either
    /// global or scoped to `app`. This is an existence probe only.
    pub fn is_user(&self, name: &str, app: &str) -> Result<bool, VerifyError> {
        let resp = self.oracle.name_state(name)?;
        let state = self.unwrap_state(resp)?;
        let found = has_signer_for(&state, app);
        tracing::debug!(parent: &self.span, name, app, found, "signer lookup");
        Ok(found)
    }

    /// Sync state and height of the processor, without unwrapping.
    pub fn probe(&self, name: &str) -> Result<(String, Option<u64>), VerifyError> {
        let resp = self.oracle.name_state(name)?;
        Ok((resp.state, resp.height))
    }

    fn unwrap_state<T>(&self, resp: GspResponse<T>) -> Result<T, VerifyError> {
        if resp.state != UP_TO_DATE {
            tracing::error!(parent: &self.span, state = %resp.state, "xid is not up-to-date");
            return Err(VerifyError::NotUpToDate { state: resp.state });
        }
        Ok(resp.data)
    }
}

fn has_signer_for(state: &NameState, app: &str) -> bool {
    state.signers.iter().any(|entry| {
        !entry.addresses.is_empty()
            && entry.application.as_deref().map_or(true, |a| a == app)
    })
}
