//! # xidauth-cli — The `xidauth` Binary
//!
//! ## Subcommands
//!
//! - `xidauth bridge` — ejabberd external-auth bridge on stdin/stdout.
//! - `xidauth serve` — decision API over HTTP.
//! - `xidauth password` — build and sign delegation-contract credentials.
//! - `xidauth name encode|decode` — chat-name transliteration.
//!
//! `bridge` and `serve` read the service map described in [`config`]:
//!
//! ```bash
//! EJABBERD_XIDAUTH_CONFIG='{"chat.example": {"app": "chat", "xid-gsp": "http://localhost:8400"}}' \
//!     xidauth bridge --logfile /var/log/ejabberd/xidauth.log
//! xidauth --config services.json serve --listen 127.0.0.1:8400
//! ```

pub mod bridge;
pub mod config;
pub mod name;
pub mod password;
pub mod serve;

use tracing::Span;

/// Span under which every component of a running service logs.
pub fn service_span() -> Span {
    tracing::info_span!("xidauth")
}
