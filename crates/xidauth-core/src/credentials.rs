//! # Login Credentials
//!
//! A [`Credentials`] value is what a client assembles when it logs in: the
//! identity name and application it claims, plus the signed [`AuthData`]
//! that travels inside the password.
//!
//! Optional fields are explicit. Reading an unset protocol yields
//! [`Protocol::XidGsp`]; an unset expiry never expires. Clearing a field
//! returns it to the unset state rather than storing a sentinel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PasswordError;
use crate::password::AuthData;

/// The signing protocol a credential was produced for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    /// Challenge/response verified by the xid game-state processor.
    #[default]
    XidGsp,
    /// Typed-data signature checked against the on-chain delegation contract.
    DelegationContract,
}

impl Protocol {
    /// Enum value of the `Protocol` field in the password message.
    pub fn code(self) -> i32 {
        match self {
            Self::XidGsp => 1,
            Self::DelegationContract => 2,
        }
    }

    /// Look up a protocol by its enum value.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::XidGsp),
            2 => Some(Self::DelegationContract),
            _ => None,
        }
    }

    /// Returns the protocol identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XidGsp => "xid-gsp",
            Self::DelegationContract => "delegation-contract",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credentials for logging in as `name` within `app`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    name: String,
    app: String,
    data: AuthData,
}

impl Credentials {
    /// Create empty credentials for an identity and application.
    pub fn new(name: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            app: app.into(),
            data: AuthData::default(),
        }
    }

    /// Create credentials for `name`/`app` from a password string.
    pub fn from_password(
        name: impl Into<String>,
        app: impl Into<String>,
        password: &str,
    ) -> Result<Self, PasswordError> {
        Ok(Self {
            name: name.into(),
            app: app.into(),
            data: AuthData::from_password(password)?,
        })
    }

    /// Replace the password-carried data with that of `password`.
    ///
    /// Any previously set protocol, expiry, extra data or signature is
    /// discarded, including when the new password omits them. On error the
    /// credentials are left untouched.
    pub fn load_password(&mut self, password: &str) -> Result<(), PasswordError> {
        self.data = AuthData::from_password(password)?;
        Ok(())
    }

    /// Encode the password-carried data.
    pub fn to_password(&self) -> Result<String, PasswordError> {
        self.data.to_password()
    }

    /// The identity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the identity name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The application.
    pub fn app(&self) -> &str {
        &self.app
    }

    /// Change the application.
    pub fn set_app(&mut self, app: impl Into<String>) {
        self.app = app.into();
    }

    /// The password-carried data.
    pub fn auth_data(&self) -> &AuthData {
        &self.data
    }

    // -----------------------------------------------------------------------
    // Protocol
    // -----------------------------------------------------------------------

    /// The signing protocol, defaulting to [`Protocol::XidGsp`].
    pub fn protocol(&self) -> Protocol {
        self.data.protocol.unwrap_or_default()
    }

    pub fn has_protocol(&self) -> bool {
        self.data.protocol.is_some()
    }

    pub fn set_protocol(&mut self, protocol: Protocol) {
        self.data.protocol = Some(protocol);
    }

    pub fn clear_protocol(&mut self) {
        self.data.protocol = None;
    }

    // -----------------------------------------------------------------------
    // Expiry
    // -----------------------------------------------------------------------

    /// Expiry as unix seconds, if set.
    pub fn expiry(&self) -> Option<i64> {
        self.data.expiry
    }

    pub fn set_expiry(&mut self, expiry: i64) {
        self.data.expiry = Some(expiry);
    }

    pub fn clear_expiry(&mut self) {
        self.data.expiry = None;
    }

    /// True if an expiry is set and lies before `now` (unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.data.expiry.is_some_and(|expiry| expiry < now)
    }

    /// True if an expiry is set and lies in the past.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }

    // -----------------------------------------------------------------------
    // Extra data
    // -----------------------------------------------------------------------

    /// Extra key/value data, ordered by key.
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.data.extra
    }

    /// Insert or overwrite one extra entry, returning the previous value.
    pub fn add_extra(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.data.extra.insert(key.into(), value.into())
    }

    /// Remove one extra entry.
    pub fn remove_extra(&mut self, key: &str) -> Option<String> {
        self.data.extra.remove(key)
    }

    /// Replace all extra data.
    pub fn set_extra<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.data.extra = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    pub fn clear_extra(&mut self) {
        self.data.extra.clear();
    }

    // -----------------------------------------------------------------------
    // Signature
    // -----------------------------------------------------------------------

    /// Raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.data.signature
    }

    pub fn set_signature(&mut self, signature: impl Into<Vec<u8>>) {
        self.data.signature = signature.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred() -> Credentials {
        Credentials::new("name", "app")
    }

    #[test]
    fn test_expiry() {
        let mut c = cred();
        assert_eq!(c.expiry(), None);
        assert!(!c.is_expired());

        c.set_expiry(123);
        assert_eq!(c.expiry(), Some(123));
        assert!(c.is_expired());

        c.set_expiry(chrono::Utc::now().timestamp() + 1_000);
        assert!(!c.is_expired());

        c.clear_expiry();
        assert_eq!(c.expiry(), None);
        assert!(!c.is_expired());
    }

    #[test]
    fn test_expiry_boundary() {
        let mut c = cred();
        c.set_expiry(100);
        assert!(!c.is_expired_at(99));
        assert!(!c.is_expired_at(100));
        assert!(c.is_expired_at(101));
    }

    #[test]
    fn test_protocol() {
        let mut c = cred();
        assert_eq!(c.protocol(), Protocol::XidGsp);
        assert!(!c.has_protocol());

        c.set_protocol(Protocol::DelegationContract);
        assert_eq!(c.protocol(), Protocol::DelegationContract);

        c.clear_protocol();
        assert_eq!(c.protocol(), Protocol::XidGsp);
        assert!(!c.has_protocol());
    }

    #[test]
    fn test_extra() {
        let mut c = cred();
        assert!(c.extra().is_empty());

        c.add_extra("foo", "bar");
        c.add_extra("baz", "abc");
        assert_eq!(c.extra().len(), 2);
        assert_eq!(c.extra()["foo"], "bar");

        c.set_extra([("x", "y"), ("z", "q")]);
        assert_eq!(
            c.extra().iter().collect::<Vec<_>>(),
            vec![
                (&"x".to_string(), &"y".to_string()),
                (&"z".to_string(), &"q".to_string())
            ]
        );

        assert_eq!(c.remove_extra("x"), Some("y".to_string()));
        c.clear_extra();
        assert!(c.extra().is_empty());
    }

    #[test]
    fn test_signature() {
        let mut c = cred();
        c.set_signature(b"foobar".to_vec());
        assert_eq!(c.signature(), b"foobar");
    }

    #[test]
    fn test_password_carries_everything_but_name_and_app() {
        let mut c = cred();
        c.set_expiry(123);
        c.set_protocol(Protocol::DelegationContract);
        c.add_extra("foo", "bar");
        c.set_signature(b"foobar".to_vec());

        let c2 = Credentials::from_password("name2", "app2", &c.to_password().unwrap()).unwrap();
        assert_eq!(c2.name(), "name2");
        assert_eq!(c2.app(), "app2");
        assert_eq!(c2.expiry(), Some(123));
        assert_eq!(c2.protocol(), Protocol::DelegationContract);
        assert_eq!(c2.extra(), c.extra());
        assert_eq!(c2.signature(), b"foobar");
    }

    #[test]
    fn test_load_password_clears_existing_data() {
        let mut c = cred();
        c.set_expiry(1234);
        c.load_password("").unwrap();
        assert_eq!(c.expiry(), None);
    }

    #[test]
    fn test_load_password_error_keeps_data() {
        let mut c = cred();
        c.set_expiry(1234);
        assert!(c.load_password("abc").is_err());
        assert_eq!(c.expiry(), Some(1234));
    }

    #[test]
    fn test_protocol_codes() {
        for p in [Protocol::XidGsp, Protocol::DelegationContract] {
            assert_eq!(Protocol::from_code(p.code()), Some(p));
        }
        assert_eq!(Protocol::from_code(0), None);
        assert_eq!(Protocol::from_code(3), None);
        assert_eq!(Protocol::DelegationContract.to_string(), "delegation-contract");
    }
}
