//! # xidauth-rpc — Network Oracles
//!
//! Production implementations of the `xidauth-verify` oracle traits:
//!
//! - [`EvmDelegationOracle`] reads the delegation and accounts contracts
//!   with `eth_call`.
//! - [`HttpGspOracle`] queries the xid game-state processor.
//!
//! Both sit on [`JsonRpcClient`], a `reqwest` JSON-RPC 2.0 client with a
//! per-endpoint timeout and blocking adapters for the sync traits.

pub mod abi;
pub mod client;
pub mod evm;
pub mod gsp;

pub use client::{JsonRpcClient, RpcConfig, DEFAULT_TIMEOUT_SECS};
pub use evm::{EvmDelegationConfig, EvmDelegationOracle};
pub use gsp::HttpGspOracle;
