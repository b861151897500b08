//! # EVM Delegation Oracle
//!
//! [`DelegationOracle`] implementation that reads the accounts and
//! delegation contracts through `eth_call` on an EVM JSON-RPC node.
//!
//! ## Discovery
//!
//! Only the delegation contract is configured. On connect the oracle reads
//! the chain id (`eth_chainId`) and the accounts-contract address
//! (`delegation.accounts()`). Both are fixed for the lifetime of the oracle.
//!
//! ## Contract Interface
//!
//! ```solidity
//! // XayaDelegation
//! function accounts() view returns (address);
//! function hasAccess(string ns, string name, string[] path,
//!                    address operator, uint256 atTime) view returns (bool);
//! // XayaAccounts (ERC-721)
//! function exists(string ns, string name) view returns (bool);
//! function tokenIdForName(string ns, string name) view returns (uint256);
//! function exists(uint256 tokenId) view returns (bool);
//! function getApproved(uint256 tokenId) view returns (address);
//! function ownerOf(uint256 tokenId) view returns (address);
//! function isApprovedForAll(address owner, address operator) view returns (bool);
//! ```
//!
//! ## Security
//!
//! The oracle holds no keys and sends no transactions.

use xidauth_crypto::{Address, SigningDomain};
use xidauth_verify::{DelegationOracle, TokenId, TransportError};

use crate::abi::{self, Token};
use crate::client::{parse_quantity, JsonRpcClient, RpcConfig};

/// Configuration for the EVM delegation oracle.
#[derive(Debug, Clone)]
pub struct EvmDelegationConfig {
    /// JSON-RPC endpoint of the node.
    pub rpc: RpcConfig,
    /// Address of the delegation contract.
    pub delegation_contract: Address,
}

impl EvmDelegationConfig {
    pub fn new(rpc_url: impl Into<String>, delegation_contract: Address) -> Self {
        Self {
            rpc: RpcConfig::new(rpc_url),
            delegation_contract,
        }
    }
}

/// Reads the delegation and accounts contracts over JSON-RPC.
#[derive(Debug)]
pub struct EvmDelegationOracle {
    client: JsonRpcClient,
    chain_id: u64,
    delegation: Address,
    accounts: Address,
    name: String,
}

impl EvmDelegationOracle {
    /// Connect to the node and discover chain id and accounts contract.
    ///
    /// Blocking; see [`JsonRpcClient::call_blocking`].
    pub fn connect(config: EvmDelegationConfig) -> Result<Self, TransportError> {
        let client = JsonRpcClient::new(config.rpc)?;

        let chain_id = parse_quantity(
            "eth_chainId",
            &client.call_blocking("eth_chainId", serde_json::json!([]))?,
        )?;

        let data = view_call(&client, config.delegation_contract, "accounts()", &[])?;
        let accounts = abi::decode_address("accounts()", &data)?;

        tracing::info!(
            url = client.url(),
            chain_id,
            delegation = %config.delegation_contract,
            accounts = %accounts,
            "connected to EVM node"
        );

        Ok(Self {
            name: format!("evm:{}", client.url()),
            client,
            chain_id,
            delegation: config.delegation_contract,
            accounts,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn accounts_contract(&self) -> Address {
        self.accounts
    }

    pub fn delegation_contract(&self) -> Address {
        self.delegation
    }

    fn call_accounts(&self, signature: &str, args: &[Token]) -> Result<Vec<u8>, TransportError> {
        view_call(&self.client, self.accounts, signature, args)
    }
}

/// `eth_call` against `to` at the latest block.
fn view_call(
    client: &JsonRpcClient,
    to: Address,
    signature: &str,
    args: &[Token],
) -> Result<Vec<u8>, TransportError> {
    let data = abi::encode_call(signature, args);
    let call = serde_json::json!({
        "to": to.to_lower_hex(),
        "data": format!("0x{}", hex::encode(data)),
    });
    let result = client
        .call_blocking("eth_call", serde_json::json!([call, "latest"]))
        .map_err(|e| match e {
            TransportError::Rpc { code, message, .. } => TransportError::Rpc {
                method: signature.to_string(),
                code,
                message,
            },
            other => other,
        })?;
    abi::parse_return_data(signature, &result)
}

fn name_args(ns: &str, name: &str) -> [Token; 2] {
    [Token::String(ns.to_string()), Token::String(name.to_string())]
}

impl DelegationOracle for EvmDelegationOracle {
    fn signing_domain(&self) -> Result<SigningDomain, TransportError> {
        Ok(SigningDomain {
            chain_id: self.chain_id,
            verifying_contract: self.delegation,
        })
    }

    fn name_exists(&self, ns: &str, name: &str) -> Result<bool, TransportError> {
        const SIG: &str = "exists(string,string)";
        abi::decode_bool(SIG, &self.call_accounts(SIG, &name_args(ns, name))?)
    }

    fn token_id_for_name(&self, ns: &str, name: &str) -> Result<TokenId, TransportError> {
        const SIG: &str = "tokenIdForName(string,string)";
        let data = self.call_accounts(SIG, &name_args(ns, name))?;
        Ok(TokenId(abi::decode_uint256(SIG, &data)?))
    }

    fn token_exists(&self, token: &TokenId) -> Result<bool, TransportError> {
        const SIG: &str = "exists(uint256)";
        abi::decode_bool(SIG, &self.call_accounts(SIG, &[Token::Uint256(token.0)])?)
    }

    fn get_approved(&self, token: &TokenId) -> Result<Address, TransportError> {
        const SIG: &str = "getApproved(uint256)";
        abi::decode_address(SIG, &self.call_accounts(SIG, &[Token::Uint256(token.0)])?)
    }

    fn owner_of(&self, token: &TokenId) -> Result<Address, TransportError> {
        const SIG: &str = "ownerOf(uint256)";
        abi::decode_address(SIG, &self.call_accounts(SIG, &[Token::Uint256(token.0)])?)
    }

    fn is_approved_for_all(
        &self,
        owner: Address,
        operator: Address,
    ) -> Result<bool, TransportError> {
        const SIG: &str = "isApprovedForAll(address,address)";
        let args = [Token::Address(owner), Token::Address(operator)];
        abi::decode_bool(SIG, &self.call_accounts(SIG, &args)?)
    }

    fn has_access(
        &self,
        ns: &str,
        name: &str,
        path: &[String],
        operator: Address,
        at: u64,
    ) -> Result<bool, TransportError> {
        const SIG: &str = "hasAccess(string,string,string[],address,uint256)";
        let args = [
            Token::String(ns.to_string()),
            Token::String(name.to_string()),
            Token::StringArray(path.to_vec()),
            Token::Address(operator),
            Token::Uint(at),
        ];
        let data = view_call(&self.client, self.delegation, SIG, &args)?;
        abi::decode_bool(SIG, &data)
    }

    fn oracle_name(&self) -> &str {
        &self.name
    }
}
