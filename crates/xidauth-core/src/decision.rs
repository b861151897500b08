//! # Authorization Decisions
//!
//! The decision vocabulary shared by every authenticator and by the rich
//! (non-bridge) API. The GSP's `verifyauth` result deserializes directly
//! into [`Decision`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;

/// Terminal state of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthState {
    /// Credentials are valid.
    Valid,
    /// Everything checked out except that the expiry has passed.
    Expired,
    /// The signature is malformed, or the signer has no permission.
    InvalidSignature,
    /// Wrong protocol, bad field contents, or unknown identity.
    InvalidData,
    /// The password could not be decoded.
    Malformed,
    /// The backing state is not synchronized. Never a plain denial.
    NotUpToDate,
}

impl AuthState {
    /// Returns the wire string for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Expired => "expired",
            Self::InvalidSignature => "invalid-signature",
            Self::InvalidData => "invalid-data",
            Self::Malformed => "malformed",
            Self::NotUpToDate => "not-up-to-date",
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of verifying one set of credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// True exactly when `state` is [`AuthState::Valid`].
    pub valid: bool,
    pub state: AuthState,
    /// The credential's expiry, echoed once the password has been decoded.
    #[serde(default)]
    pub expiry: Option<i64>,
    /// The credential's extra data, echoed once the password has been decoded.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Decision {
    /// A decision that carries no credential data (password not decoded).
    pub fn bare(state: AuthState) -> Self {
        Self {
            valid: state == AuthState::Valid,
            state,
            expiry: None,
            extra: BTreeMap::new(),
        }
    }

    /// A decision echoing the expiry and extra data of `cred`.
    pub fn for_credentials(state: AuthState, cred: &Credentials) -> Self {
        Self {
            valid: state == AuthState::Valid,
            state,
            expiry: cred.expiry(),
            extra: cred.extra().clone(),
        }
    }

    /// Shorthand for a bare [`AuthState::Malformed`] decision.
    pub fn malformed() -> Self {
        Self::bare(AuthState::Malformed)
    }
}
