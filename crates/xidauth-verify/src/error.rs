//! # Verification Errors
//!
//! Denials are not errors: an invalid signature, an unknown identity or an
//! expired credential all produce a [`Decision`](xidauth_core::Decision).
//! The errors here are the conditions under which no trustworthy decision
//! can be made at all.

use thiserror::Error;

/// Failure talking to a ledger node or game-state processor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The endpoint could not be reached or answered with an HTTP error.
    #[error("{endpoint} unavailable: {reason}")]
    Unavailable {
        /// Endpoint URL or oracle name.
        endpoint: String,
        /// Human-readable cause.
        reason: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("{endpoint} timed out")]
    Timeout {
        /// Endpoint URL or oracle name.
        endpoint: String,
    },

    /// The endpoint answered with a JSON-RPC error object.
    #[error("RPC error {code} from {method}: {message}")]
    Rpc {
        /// The JSON-RPC method that failed.
        method: String,
        /// JSON-RPC error code.
        code: i64,
        /// JSON-RPC error message.
        message: String,
    },

    /// The response could not be interpreted.
    #[error("invalid response to {method}: {reason}")]
    InvalidResponse {
        /// The method whose response was rejected.
        method: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A synchronous call was made outside of a Tokio runtime.
    #[error("no async runtime available")]
    NoRuntime,
}

/// Error from an authenticator or the server directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The backend could not be queried.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The game-state processor is not synchronized.
    #[error("backend is not up-to-date: {state}")]
    NotUpToDate {
        /// The sync state reported by the backend.
        state: String,
    },

    /// No authenticators are configured for this XMPP server.
    #[error("server {0} is not configured for xidauth")]
    UnknownServer(String),
}

impl VerifyError {
    /// True for conditions that must stop the chat-server bridge rather than
    /// be answered as a denial.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnknownServer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(VerifyError::Transport(TransportError::NoRuntime).is_fatal());
        assert!(VerifyError::NotUpToDate {
            state: "catching-up".into()
        }
        .is_fatal());
        assert!(!VerifyError::UnknownServer("chat.example".into()).is_fatal());
    }

    #[test]
    fn test_display_messages() {
        let e = VerifyError::from(TransportError::Rpc {
            method: "eth_call".into(),
            code: -32000,
            message: "execution reverted".into(),
        });
        assert_eq!(
            e.to_string(),
            "transport failure: RPC error -32000 from eth_call: execution reverted"
        );
        assert_eq!(
            TransportError::Timeout {
                endpoint: "http://localhost:8545".into()
            }
            .to_string(),
            "http://localhost:8545 timed out"
        );
    }
}
