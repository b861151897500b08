//! # Service Configuration
//!
//! The bridge and the API server read the same JSON service map, keyed by
//! XMPP server name:
//!
//! ```json
//! {
//!   "chat.example": {
//!     "app": "chat",
//!     "xid-gsp": "http://localhost:8400",
//!     "delegation-contract": {
//!       "rpc": "http://localhost:8545",
//!       "contract": "0xEB4c2EF7874628B646B8A59e4A309B94e14C2a6B"
//!     },
//!     "rpc-timeout": 10
//!   }
//! }
//! ```
//!
//! The map comes from `--config <file>` or, failing that, from the
//! `EJABBERD_XIDAUTH_CONFIG` environment variable (which holds the JSON
//! itself, not a path). Unknown keys are rejected. Every server needs an
//! `app` and at least one authenticator.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Span;
use xidauth_crypto::Address;
use xidauth_rpc::{EvmDelegationConfig, EvmDelegationOracle, HttpGspOracle, RpcConfig};
use xidauth_verify::{
    AuthMetrics, AuthService, Authenticator, DelegationVerifier, GspAuthenticator, ServerAuth,
};

/// Environment variable holding the JSON service map.
pub const CONFIG_ENV: &str = "EJABBERD_XIDAUTH_CONFIG";

/// Delegation-contract backend of one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelegationConfig {
    /// JSON-RPC endpoint of the EVM node.
    pub rpc: String,
    /// Address of the delegation contract.
    pub contract: Address,
}

/// Configuration of one XMPP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Application string the server authenticates for.
    pub app: String,
    /// JSON-RPC endpoint of the xid game-state processor.
    #[serde(rename = "xid-gsp", default, skip_serializing_if = "Option::is_none")]
    pub xid_gsp: Option<String>,
    #[serde(
        rename = "delegation-contract",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub delegation_contract: Option<DelegationConfig>,
    /// Per-request timeout for both backends, in seconds.
    #[serde(rename = "rpc-timeout", default, skip_serializing_if = "Option::is_none")]
    pub rpc_timeout: Option<u64>,
}

impl ServerConfig {
    fn has_authenticators(&self) -> bool {
        self.xid_gsp.is_some() || self.delegation_contract.is_some()
    }

    fn rpc(&self, url: &str) -> RpcConfig {
        let rpc = RpcConfig::new(url);
        match self.rpc_timeout {
            Some(secs) => rpc.with_timeout(secs),
            None => rpc,
        }
    }
}

/// The full service map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceConfig {
    pub servers: BTreeMap<String, ServerConfig>,
}

impl ServiceConfig {
    /// Parse and validate a JSON service map.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("invalid service config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from [`CONFIG_ENV`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let json = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config: {}", p.display()))?;
                Self::from_json(&json).with_context(|| format!("in {}", p.display()))
            }
            None => {
                let json = std::env::var(CONFIG_ENV)
                    .with_context(|| format!("{CONFIG_ENV} must be set, or --config given"))?;
                Self::from_json(&json).with_context(|| format!("in ${CONFIG_ENV}"))
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.servers.is_empty() {
            bail!("no servers configured");
        }
        for (name, srv) in &self.servers {
            if srv.app.is_empty() {
                bail!("config for server {name} has an empty app");
            }
            if !srv.has_authenticators() {
                bail!("config for server {name} has no authenticators");
            }
            if srv.rpc_timeout == Some(0) {
                bail!("config for server {name} has a zero rpc-timeout");
            }
        }
        Ok(())
    }

    /// Connect every backend and assemble the [`AuthService`].
    ///
    /// Connecting a delegation contract performs blocking RPC calls, so this
    /// must run on a thread that may block inside a tokio runtime context.
    pub fn build(&self, span: &Span, metrics: Option<AuthMetrics>) -> Result<AuthService> {
        let mut service = AuthService::new(span.clone());
        if let Some(m) = metrics {
            service = service.with_metrics(m);
        }

        for (name, srv) in &self.servers {
            let mut auth = ServerAuth::new(srv.app.clone());

            if let Some(url) = &srv.xid_gsp {
                let oracle = HttpGspOracle::new(srv.rpc(url))
                    .with_context(|| format!("server {name}: xid-gsp {url}"))?;
                auth.add(Authenticator::Gsp(GspAuthenticator::new(
                    Arc::new(oracle),
                    span.clone(),
                )));
            }

            if let Some(dc) = &srv.delegation_contract {
                let oracle = EvmDelegationOracle::connect(EvmDelegationConfig {
                    rpc: srv.rpc(&dc.rpc),
                    delegation_contract: dc.contract,
                })
                .with_context(|| format!("server {name}: delegation contract at {}", dc.rpc))?;
                let verifier = DelegationVerifier::connect(Arc::new(oracle), span.clone())
                    .with_context(|| format!("server {name}: signing domain"))?;
                auth.add(Authenticator::Delegation(verifier));
            }

            service.insert(name.clone(), auth);
        }

        Ok(service)
    }
}
