//! # End-to-End Delegation Flow
//!
//! A client builds delegation-contract credentials, signs them with its key
//! and transports them as a password; the server decodes the chat name and
//! the password and resolves them against an in-memory ledger.

use std::sync::Arc;

use tracing::Span;
use xidauth_core::{encode_identity_name, AuthState, Credentials, Protocol};
use xidauth_crypto::{MessageEncoder, SecpKeyPair, SigningDomain};
use xidauth_verify::{
    AuthService, Authenticator, DelegationVerifier, MemoryLedger, ServerAuth,
};

const CONTRACT: &str = "0xEB4c2EF7874628B646B8A59e4A309B94e14C2a6B";

fn domain() -> SigningDomain {
    SigningDomain {
        chain_id: 137,
        verifying_contract: CONTRACT.parse().unwrap(),
    }
}

fn password_for(key: &SecpKeyPair, name: &str, app: &str, expiry: Option<i64>) -> String {
    let mut cred = Credentials::new(name, app);
    cred.set_protocol(Protocol::DelegationContract);
    if let Some(e) = expiry {
        cred.set_expiry(e);
    }
    cred.add_extra("client", "test");
    let sig = key.sign(&MessageEncoder::new(domain()).encode(&cred));
    cred.set_signature(sig.to_vec());
    cred.to_password().unwrap()
}

fn service(ledger: Arc<MemoryLedger>) -> AuthService {
    let verifier = DelegationVerifier::connect(ledger, Span::none()).unwrap();
    let mut service = AuthService::new(Span::none());
    service.insert(
        "chat.example",
        ServerAuth::new("app").with(Authenticator::Delegation(verifier)),
    );
    service
}

#[test]
fn owner_signed_credentials_are_valid() {
    let ledger = Arc::new(MemoryLedger::new(domain()));
    let owner = SecpKeyPair::generate();
    ledger.register("domob", owner.address());
    let service = service(ledger);

    let far_future = chrono::Utc::now().timestamp() + 3_600;
    let pwd = password_for(&owner, "domob", "app", Some(far_future));
    let d = service.authenticate("domob", "chat.example", &pwd).unwrap();
    assert!(d.valid);
    assert_eq!(d.state, AuthState::Valid);
    assert_eq!(d.expiry, Some(far_future));
    assert_eq!(d.extra["client"], "test");
}

#[test]
fn unrelated_key_is_invalid_signature() {
    let ledger = Arc::new(MemoryLedger::new(domain()));
    ledger.register("domob", SecpKeyPair::generate().address());
    let service = service(ledger);

    let pwd = password_for(&SecpKeyPair::generate(), "domob", "app", None);
    let d = service.authenticate("domob", "chat.example", &pwd).unwrap();
    assert_eq!(d.state, AuthState::InvalidSignature);
    assert!(!d.valid);
}

#[test]
fn expired_credentials_echo_data() {
    let ledger = Arc::new(MemoryLedger::new(domain()));
    let owner = SecpKeyPair::generate();
    ledger.register("domob", owner.address());
    let service = service(ledger);

    let pwd = password_for(&owner, "domob", "app", Some(123));
    let d = service.authenticate("domob", "chat.example", &pwd).unwrap();
    assert_eq!(d.state, AuthState::Expired);
    assert_eq!(d.expiry, Some(123));
    assert_eq!(d.extra["client"], "test");
}

#[test]
fn non_simple_names_travel_hex_encoded() {
    let ledger = Arc::new(MemoryLedger::new(domain()));
    let owner = SecpKeyPair::generate();
    ledger.register("Dömob", owner.address());
    let service = service(ledger);

    let pwd = password_for(&owner, "Dömob", "app", None);
    let chat_name = encode_identity_name("Dömob");
    assert!(chat_name.starts_with("x-"));
    assert!(service.authenticate(&chat_name, "chat.example", &pwd).unwrap().valid);
    assert!(service.is_user(&chat_name, "chat.example").unwrap());
}

#[test]
fn malformed_password() {
    let ledger = Arc::new(MemoryLedger::new(domain()));
    ledger.register("domob", SecpKeyPair::generate().address());
    let service = service(ledger);

    let d = service
        .authenticate("domob", "chat.example", "not base64!")
        .unwrap();
    assert_eq!(d.state, AuthState::Malformed);
    assert_eq!(d.expiry, None);
    assert!(d.extra.is_empty());
}
