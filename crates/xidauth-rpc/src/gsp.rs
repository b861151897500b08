//! # xid GSP Oracle
//!
//! [`GspOracle`] implementation for the xid game-state processor's JSON-RPC
//! interface. Both methods take named parameters and return the standard
//! `{state, height, data}` envelope.

use xidauth_core::Decision;
use xidauth_verify::{GspOracle, GspResponse, NameState, TransportError};

use crate::client::{JsonRpcClient, RpcConfig};

/// JSON-RPC client for xid.
#[derive(Debug)]
pub struct HttpGspOracle {
    client: JsonRpcClient,
    name: String,
}

impl HttpGspOracle {
    pub fn new(config: RpcConfig) -> Result<Self, TransportError> {
        let client = JsonRpcClient::new(config)?;
        Ok(Self {
            name: format!("xid:{}", client.url()),
            client,
        })
    }
}

impl GspOracle for HttpGspOracle {
    fn verify_auth(
        &self,
        name: &str,
        application: &str,
        password: &str,
    ) -> Result<GspResponse<Decision>, TransportError> {
        self.client.call_typed(
            "verifyauth",
            serde_json::json!({
                "name": name,
                "application": application,
                "password": password,
            }),
        )
    }

    fn name_state(&self, name: &str) -> Result<GspResponse<NameState>, TransportError> {
        self.client
            .call_typed("getnamestate", serde_json::json!({ "name": name }))
    }

    fn oracle_name(&self) -> &str {
        &self.name
    }
}
