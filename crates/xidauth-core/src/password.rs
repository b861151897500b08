//! # Password Codec
//!
//! A password is the standard-base64 form of a serialized `AuthData`
//! protocol buffer (`proto/auth.proto`): the part of a login credential that
//! is not carried alongside it (the identity name and application travel
//! separately).
//!
//! ## Message
//!
//! ```text
//! optional bytes    signature_bytes = 1;
//! optional uint64   expiry          = 2;   // unix seconds
//! map<string,string> extra          = 3;
//! optional Protocol protocol        = 4;   // XID_GSP = 1, DELEGATION_CONTRACT = 2
//! ```
//!
//! The fields are proto2 `optional`, so an unset protocol or expiry is
//! distinguishable from an explicit one. Unknown fields are skipped; an
//! unknown protocol value is rejected.
//!
//! The empty payload (the empty password) decodes to all-defaults.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use prost::Message;

use crate::credentials::Protocol;
use crate::error::PasswordError;

/// The serialized part of a credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthData {
    /// Signing protocol, if explicitly set.
    pub protocol: Option<Protocol>,
    /// Expiry as unix seconds, if any.
    pub expiry: Option<i64>,
    /// Application-defined key/value data covered by the signature.
    pub extra: BTreeMap<String, String>,
    /// Raw signature bytes.
    pub signature: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Wire message
// ---------------------------------------------------------------------------

/// `xid.AuthData` as laid out in `proto/auth.proto`.
#[derive(Clone, PartialEq, Message)]
struct AuthDataProto {
    #[prost(bytes = "vec", optional, tag = "1")]
    signature_bytes: Option<Vec<u8>>,
    #[prost(uint64, optional, tag = "2")]
    expiry: Option<u64>,
    #[prost(btree_map = "string, string", tag = "3")]
    extra: BTreeMap<String, String>,
    #[prost(enumeration = "ProtocolProto", optional, tag = "4")]
    protocol: Option<i32>,
}

/// `xid.Protocol`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, prost::Enumeration)]
#[repr(i32)]
enum ProtocolProto {
    XidGsp = 1,
    DelegationContract = 2,
}

impl From<Protocol> for ProtocolProto {
    fn from(p: Protocol) -> Self {
        match p {
            Protocol::XidGsp => Self::XidGsp,
            Protocol::DelegationContract => Self::DelegationContract,
        }
    }
}

impl AuthData {
    /// Serialize into the protobuf payload.
    pub fn encode(&self) -> Result<Vec<u8>, PasswordError> {
        let expiry = self
            .expiry
            .map(|e| u64::try_from(e).map_err(|_| PasswordError::NegativeExpiry(e)))
            .transpose()?;

        let msg = AuthDataProto {
            signature_bytes: (!self.signature.is_empty()).then(|| self.signature.clone()),
            expiry,
            extra: self.extra.clone(),
            protocol: self.protocol.map(|p| ProtocolProto::from(p) as i32),
        };
        Ok(msg.encode_to_vec())
    }

    /// Parse a protobuf payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, PasswordError> {
        let msg = AuthDataProto::decode(bytes).map_err(|e| PasswordError::Decode(e.to_string()))?;

        let protocol = msg
            .protocol
            .map(|code| Protocol::from_code(code).ok_or(PasswordError::UnknownProtocol(code)))
            .transpose()?;
        let expiry = msg
            .expiry
            .map(|e| i64::try_from(e).map_err(|_| PasswordError::ExpiryOverflow(e)))
            .transpose()?;

        Ok(Self {
            protocol,
            expiry,
            extra: msg.extra,
            signature: msg.signature_bytes.unwrap_or_default(),
        })
    }

    /// Encode as a password string.
    pub fn to_password(&self) -> Result<String, PasswordError> {
        Ok(STANDARD.encode(self.encode()?))
    }

    /// Decode a password string.
    pub fn from_password(password: &str) -> Result<Self, PasswordError> {
        let raw = STANDARD
            .decode(password)
            .map_err(|e| PasswordError::Base64(e.to_string()))?;
        Self::decode(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuthData {
        let mut data = AuthData {
            protocol: Some(Protocol::DelegationContract),
            expiry: Some(1234),
            signature: b"signature".to_vec(),
            ..Default::default()
        };
        data.extra.insert("foo".into(), "bar".into());
        data.extra.insert("abc".into(), "def".into());
        data
    }

    #[test]
    fn test_password_roundtrip() {
        let data = sample();
        let password = data.to_password().unwrap();
        assert_eq!(AuthData::from_password(&password).unwrap(), data);
    }

    #[test]
    fn test_known_protobuf_bytes() {
        let mut data = AuthData {
            protocol: Some(Protocol::DelegationContract),
            expiry: Some(1234),
            signature: vec![0xaa],
            ..Default::default()
        };
        data.extra.insert("foo".into(), "bar".into());

        let expected = vec![
            0x0a, 0x01, 0xaa, // signature_bytes
            0x10, 0xd2, 0x09, // expiry
            0x1a, 0x0a, 0x0a, 0x03, b'f', b'o', b'o', 0x12, 0x03, b'b', b'a', b'r', // extra
            0x20, 0x02, // protocol
        ];
        assert_eq!(data.encode().unwrap(), expected);
        assert_eq!(AuthData::decode(&expected).unwrap(), data);
    }

    #[test]
    fn test_field_order_does_not_matter() {
        let bytes = [0x20, 0x02, 0x10, 0xd2, 0x09, 0x0a, 0x01, 0xaa];
        let data = AuthData::decode(&bytes).unwrap();
        assert_eq!(data.protocol, Some(Protocol::DelegationContract));
        assert_eq!(data.expiry, Some(1234));
        assert_eq!(data.signature, vec![0xaa]);
    }

    #[test]
    fn test_absent_fields_have_no_bytes() {
        assert!(AuthData::default().encode().unwrap().is_empty());
        let decoded = AuthData::decode(&[]).unwrap();
        assert_eq!(decoded.protocol, None);
        assert_eq!(decoded.expiry, None);
    }

    #[test]
    fn test_explicit_defaults_keep_presence() {
        let data = AuthData {
            protocol: Some(Protocol::XidGsp),
            expiry: Some(0),
            ..Default::default()
        };
        let bytes = data.encode().unwrap();
        assert_eq!(bytes, vec![0x10, 0x00, 0x20, 0x01]);
        assert_eq!(AuthData::decode(&bytes).unwrap(), data);
    }

    #[test]
    fn test_varying_lengths_survive_base64_padding() {
        for i in 0..100 {
            let mut data = AuthData::default();
            data.extra.insert("key".into(), "x".repeat(i));
            let password = data.to_password().unwrap();
            assert_eq!(AuthData::from_password(&password).unwrap(), data);
        }
    }

    #[test]
    fn test_empty_password_is_default() {
        assert_eq!(AuthData::from_password("").unwrap(), AuthData::default());
    }

    #[test]
    fn test_invalid_base64() {
        assert!(matches!(
            AuthData::from_password("abc"),
            Err(PasswordError::Base64(_))
        ));
        assert!(matches!(
            AuthData::from_password("not base64!"),
            Err(PasswordError::Base64(_))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let full = sample().encode().unwrap();
        assert!(matches!(
            AuthData::decode(&full[..2]),
            Err(PasswordError::Decode(_))
        ));
        // "CgU=" is a signature field announcing five bytes and carrying none.
        assert!(matches!(
            AuthData::from_password("CgU="),
            Err(PasswordError::Decode(_))
        ));
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let bytes = [0x28, 0x01, 0x10, 0x05];
        assert_eq!(
            AuthData::decode(&bytes).unwrap(),
            AuthData {
                expiry: Some(5),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_rejects_unknown_protocol() {
        assert_eq!(
            AuthData::decode(&[0x20, 0x07]),
            Err(PasswordError::UnknownProtocol(7))
        );
        assert_eq!(
            AuthData::decode(&[0x20, 0x00]),
            Err(PasswordError::UnknownProtocol(0))
        );
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        // extra entry whose key is the single byte 0xff
        let bytes = [0x1a, 0x03, 0x0a, 0x01, 0xff];
        assert!(matches!(
            AuthData::decode(&bytes),
            Err(PasswordError::Decode(_))
        ));
    }

    #[test]
    fn test_expiry_range() {
        let data = AuthData {
            expiry: Some(-1),
            ..Default::default()
        };
        assert_eq!(data.encode(), Err(PasswordError::NegativeExpiry(-1)));

        let mut bytes = vec![0x10];
        bytes.extend([0xff; 9]);
        bytes.push(0x01);
        assert_eq!(
            AuthData::decode(&bytes),
            Err(PasswordError::ExpiryOverflow(u64::MAX))
        );
    }
}
