//! # Password Subcommand
//!
//! Builds delegation-contract credentials for an identity, signs them with
//! a secp256k1 key and prints the resulting password.
//!
//! ## Security Invariant
//!
//! The key file is read once and never logged; only the derived address is
//! reported. Whether the address may act for the identity is decided by the
//! delegation contract at login time, not here.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use xidauth_core::{Credentials, Protocol};
use xidauth_crypto::{Address, MessageEncoder, SecpKeyPair, SigningDomain};

/// Arguments for `xidauth password`.
#[derive(Args, Debug)]
pub struct PasswordArgs {
    /// Identity name to log in as (not the chat name).
    #[arg(long)]
    pub name: String,

    /// Application string of the target server.
    #[arg(long)]
    pub app: String,

    /// File holding the hex-encoded 32-byte secp256k1 secret key.
    #[arg(long)]
    pub key: PathBuf,

    /// Chain id of the delegation contract's network.
    #[arg(long)]
    pub chain_id: u64,

    /// Address of the delegation contract.
    #[arg(long)]
    pub contract: Address,

    /// Expire the password this many seconds from now.
    #[arg(long, conflicts_with = "expiry")]
    pub valid_for: Option<u64>,

    /// Absolute expiry as a UNIX timestamp.
    #[arg(long)]
    pub expiry: Option<i64>,

    /// Extra data as `key=value`; repeatable.
    #[arg(long = "extra", value_name = "KEY=VALUE")]
    pub extra: Vec<String>,
}

/// Execute the password subcommand.
pub fn run_password(args: &PasswordArgs) -> Result<u8> {
    let key = load_key(&args.key)?;
    let domain = SigningDomain {
        chain_id: args.chain_id,
        verifying_contract: args.contract,
    };

    let expiry = match (args.expiry, args.valid_for) {
        (Some(e), _) => Some(e),
        (None, Some(secs)) => {
            let secs = i64::try_from(secs).context("--valid-for is too large")?;
            Some(chrono::Utc::now().timestamp().saturating_add(secs))
        }
        (None, None) => None,
    };

    let extra = args
        .extra
        .iter()
        .map(|kv| parse_extra(kv))
        .collect::<Result<Vec<_>>>()?;

    let password = build_password(&key, domain, &args.name, &args.app, expiry, extra)?;
    tracing::info!(signer = %key.address(), name = %args.name, app = %args.app, "signed credentials");
    println!("{password}");
    Ok(0)
}

/// Sign delegation-contract credentials and encode them as a password.
pub fn build_password(
    key: &SecpKeyPair,
    domain: SigningDomain,
    name: &str,
    app: &str,
    expiry: Option<i64>,
    extra: Vec<(String, String)>,
) -> Result<String> {
    let mut cred = Credentials::new(name, app);
    cred.set_protocol(Protocol::DelegationContract);
    if let Some(e) = expiry {
        cred.set_expiry(e);
    }
    cred.set_extra(extra);

    let msg = MessageEncoder::new(domain).encode(&cred);
    cred.set_signature(key.sign(&msg).to_vec());
    cred.to_password().context("failed to encode password")
}

fn load_key(path: &Path) -> Result<SecpKeyPair> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read key file: {}", path.display()))?;
    SecpKeyPair::from_hex(text.trim())
        .with_context(|| format!("invalid secp256k1 key in {}", path.display()))
}

fn parse_extra(kv: &str) -> Result<(String, String)> {
    match kv.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => bail!("extra data must be KEY=VALUE, got {kv:?}"),
    }
}
