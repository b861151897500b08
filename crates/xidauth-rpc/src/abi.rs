//! # Contract ABI Encoding
//!
//! Just enough of the Solidity ABI to call the view functions of the
//! accounts and delegation contracts: `string`, `string[]`, `address` and
//! `uint256` arguments; `bool`, `address` and `uint256` return values.
//!
//! Calldata is `selector(signature) || head || tail`, where static
//! arguments sit in the head and dynamic arguments are referenced from the
//! head by byte offsets into the tail.

use xidauth_crypto::{keccak256, Address};
use xidauth_verify::TransportError;

const WORD: usize = 32;

/// A call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(u64),
    Uint256([u8; 32]),
    String(String),
    StringArray(Vec<String>),
}

impl Token {
    fn is_dynamic(&self) -> bool {
        matches!(self, Self::String(_) | Self::StringArray(_))
    }
}

/// First four bytes of the Keccak-256 of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a full call: selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend_from_slice(&encode_args(args));
    out
}

/// Encode an argument tuple.
pub fn encode_args(args: &[Token]) -> Vec<u8> {
    let head_len = WORD * args.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        if arg.is_dynamic() {
            head.extend_from_slice(&uint_word((head_len + tail.len()) as u64));
            tail.extend_from_slice(&encode_dynamic(arg));
        } else {
            head.extend_from_slice(&encode_static(arg));
        }
    }

    head.extend_from_slice(&tail);
    head
}

fn encode_static(arg: &Token) -> [u8; 32] {
    match arg {
        Token::Address(addr) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr.as_bytes());
            word
        }
        Token::Uint(v) => uint_word(*v),
        Token::Uint256(word) => *word,
        Token::String(_) | Token::StringArray(_) => [0u8; 32],
    }
}

fn encode_dynamic(arg: &Token) -> Vec<u8> {
    match arg {
        Token::String(s) => encode_bytes(s.as_bytes()),
        Token::StringArray(items) => {
            let mut out = uint_word(items.len() as u64).to_vec();
            let tokens: Vec<Token> = items.iter().cloned().map(Token::String).collect();
            out.extend_from_slice(&encode_args(&tokens));
            out
        }
        _ => encode_static(arg).to_vec(),
    }
}

fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = uint_word(bytes.len() as u64).to_vec();
    out.extend_from_slice(bytes);
    let padding = (WORD - bytes.len() % WORD) % WORD;
    out.resize(out.len() + padding, 0);
    out
}

fn uint_word(v: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&v.to_be_bytes());
    word
}

// ---------------------------------------------------------------------------
// Return values
// ---------------------------------------------------------------------------

/// Parse `eth_call` return data (a `0x`-prefixed hex string).
pub fn parse_return_data(method: &str, value: &serde_json::Value) -> Result<Vec<u8>, TransportError> {
    let invalid = |reason: String| TransportError::InvalidResponse {
        method: method.to_string(),
        reason,
    };
    let s = value
        .as_str()
        .ok_or_else(|| invalid(format!("expected hex string, got {value}")))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| invalid(format!("missing 0x prefix: {s}")))?;
    hex::decode(digits).map_err(|e| invalid(format!("invalid hex: {e}")))
}

fn first_word<'a>(method: &str, data: &'a [u8]) -> Result<&'a [u8], TransportError> {
    data.get(..WORD).ok_or_else(|| TransportError::InvalidResponse {
        method: method.to_string(),
        reason: format!("expected at least {WORD} bytes, got {}", data.len()),
    })
}

/// Decode a single `bool` return value.
pub fn decode_bool(method: &str, data: &[u8]) -> Result<bool, TransportError> {
    let word = first_word(method, data)?;
    if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
        return Err(TransportError::InvalidResponse {
            method: method.to_string(),
            reason: "not a boolean".to_string(),
        });
    }
    Ok(word[31] == 1)
}

/// Decode a single `address` return value.
pub fn decode_address(method: &str, data: &[u8]) -> Result<Address, TransportError> {
    let word = first_word(method, data)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(TransportError::InvalidResponse {
            method: method.to_string(),
            reason: "not an address".to_string(),
        });
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[12..]);
    Ok(Address::from_bytes(bytes))
}

/// Decode a single `uint256` return value.
pub fn decode_uint256(method: &str, data: &[u8]) -> Result<[u8; 32], TransportError> {
    let word = first_word(method, data)?;
    let mut out = [0u8; 32];
    out.copy_from_slice(word);
    Ok(out)
}
