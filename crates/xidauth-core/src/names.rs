//! # Chat Name Transliteration
//!
//! XMPP treats user names case-insensitively and restricts the characters
//! that may appear in them, while identity names on the ledger are arbitrary
//! Unicode strings. This module maps between the two namespaces.
//!
//! ## Encoding
//!
//! - A *simple* name (non-empty, only `[0-9a-z]`) is used as-is.
//! - Every other name, including the empty string, is written as `x-`
//!   followed by the lowercase hex of its UTF-8 bytes.
//!
//! ## Security Invariant
//!
//! Every identity name has exactly one valid chat name. Decoding rejects
//! uppercase hex and rejects `x-` names whose payload is itself simple, so two
//! different chat accounts can never authenticate as the same identity.

use crate::error::NameError;

/// Prefix marking a hex-encoded chat name.
pub const HEX_PREFIX: &str = "x-";

fn is_simple_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_lowercase()
}

fn is_lower_hex_char(c: char) -> bool {
    c.is_ascii_digit() || ('a'..='f').contains(&c)
}

/// Returns true if `name` is non-empty and consists only of `[0-9a-z]`.
pub fn is_simple_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_simple_char)
}

/// Decode a chat name into the identity name it stands for.
pub fn decode_chat_name(chat: &str) -> Result<String, NameError> {
    if chat.is_empty() {
        return Err(NameError::Empty);
    }

    let Some(hex_part) = chat.strip_prefix(HEX_PREFIX) else {
        if let Some(ch) = chat.chars().find(|c| !is_simple_char(*c)) {
            return Err(NameError::InvalidSimpleChar {
                name: chat.to_string(),
                ch,
            });
        }
        return Ok(chat.to_string());
    };

    if let Some(ch) = hex_part.chars().find(|c| !is_lower_hex_char(*c)) {
        return Err(NameError::InvalidHexChar {
            name: chat.to_string(),
            ch,
        });
    }
    if hex_part.len() % 2 != 0 {
        return Err(NameError::OddLength(chat.to_string()));
    }

    let bytes = hex::decode(hex_part).map_err(|_| NameError::OddLength(chat.to_string()))?;
    let identity = String::from_utf8(bytes).map_err(|_| NameError::InvalidUtf8(chat.to_string()))?;

    // The empty identity is only reachable through the bare prefix.
    if identity.is_empty() {
        return Ok(identity);
    }
    if is_simple_name(&identity) {
        return Err(NameError::SimpleNameEncoded(chat.to_string()));
    }

    Ok(identity)
}

/// Encode an identity name as its unique chat name.
pub fn encode_identity_name(identity: &str) -> String {
    if is_simple_name(identity) {
        return identity.to_string();
    }
    format!("{HEX_PREFIX}{}", hex::encode(identity.as_bytes()))
}
