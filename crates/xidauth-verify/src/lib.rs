//! # xidauth-verify — Authorization Decisions
//!
//! Turns a decoded identity name, an application and a password into a
//! [`Decision`](xidauth_core::Decision), consulting external state through
//! read-only oracles.
//!
//! ## Modules
//!
//! - [`oracle`]: the [`DelegationOracle`] and [`GspOracle`] traits and the
//!   GSP response types.
//! - [`delegation`]: the delegation-contract resolver.
//! - [`gsp`]: the game-state-processor authenticator.
//! - [`authenticator`]: the [`Authenticator`] strategy enum, per-server
//!   sets and the server directory used by the bridge and the API.
//! - [`metrics`]: Prometheus counters for decisions and failures.
//! - [`mock`]: in-memory oracles.
//!
//! ## Error Model
//!
//! Denials are decisions. Transport failures and stale backend state are
//! [`VerifyError`]s and must never be turned into a plain "no".

pub mod authenticator;
pub mod delegation;
pub mod error;
pub mod gsp;
pub mod metrics;
pub mod mock;
pub mod oracle;

pub use authenticator::{AuthService, Authenticator, ServerAuth};
pub use delegation::DelegationVerifier;
pub use error::{TransportError, VerifyError};
pub use gsp::GspAuthenticator;
pub use metrics::AuthMetrics;
pub use mock::{MemoryGsp, MemoryLedger};
pub use oracle::{
    access_path, DelegationOracle, GspOracle, GspResponse, NameState, SignerEntry, TokenId,
    PLAYER_NAMESPACE, UP_TO_DATE,
};
