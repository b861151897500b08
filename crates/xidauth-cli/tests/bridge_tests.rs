//! # Bridge Loop Tests
//!
//! Feeds framed ejabberd commands through [`bridge::run`] against an
//! in-memory ledger and game-state processor and checks the raw responses.

use std::io::Cursor;
use std::sync::Arc;

use tracing::Span;
use xidauth_cli::bridge;
use xidauth_cli::password::build_password;
use xidauth_crypto::{SecpKeyPair, SigningDomain};
use xidauth_verify::{
    AuthService, Authenticator, DelegationVerifier, GspAuthenticator, MemoryGsp, MemoryLedger,
    NameState, ServerAuth, SignerEntry, TransportError,
};

const ACCEPT: [u8; 4] = [0, 2, 0, 1];
const DENY: [u8; 4] = [0, 2, 0, 0];

struct Fixture {
    ledger: Arc<MemoryLedger>,
    gsp: Arc<MemoryGsp>,
    owner: SecpKeyPair,
    service: AuthService,
}

fn domain() -> SigningDomain {
    SigningDomain {
        chain_id: 137,
        verifying_contract: "0xEB4c2EF7874628B646B8A59e4A309B94e14C2a6B".parse().unwrap(),
    }
}

/// `chat.example` accepts either backend; `gsp.example` only the GSP.
fn fixture() -> Fixture {
    let ledger = Arc::new(MemoryLedger::new(domain()));
    let gsp = Arc::new(MemoryGsp::new());
    let owner = SecpKeyPair::generate();
    ledger.register("domob", owner.address());
    ledger.register("Dömob", owner.address());

    let mut service = AuthService::new(Span::none());
    service.insert(
        "chat.example",
        ServerAuth::new("chat")
            .with(Authenticator::Gsp(GspAuthenticator::new(
                gsp.clone(),
                Span::none(),
            )))
            .with(Authenticator::Delegation(DelegationVerifier::new(
                ledger.clone(),
                domain(),
                Span::none(),
            ))),
    );
    service.insert(
        "gsp.example",
        ServerAuth::new("game").with(Authenticator::Gsp(GspAuthenticator::new(
            gsp.clone(),
            Span::none(),
        ))),
    );

    Fixture {
        ledger,
        gsp,
        owner,
        service,
    }
}

fn frames(cmds: &[&str]) -> Vec<u8> {
    let mut out = Vec::new();
    for cmd in cmds {
        out.extend_from_slice(&(cmd.len() as i16).to_be_bytes());
        out.extend_from_slice(cmd.as_bytes());
    }
    out
}

fn run(service: &AuthService, cmds: &[&str]) -> anyhow::Result<Vec<[u8; 4]>> {
    let mut output = Vec::new();
    bridge::run(service, Cursor::new(frames(cmds)), &mut output)?;
    Ok(output
        .chunks(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect())
}

fn password(key: &SecpKeyPair, name: &str, app: &str) -> String {
    build_password(key, domain(), name, app, None, vec![]).unwrap()
}

#[test]
fn delegation_auth_accepts_owner() {
    let f = fixture();
    let pwd = password(&f.owner, "domob", "chat");
    let cmd = format!("auth:domob:chat.example:{pwd}");
    assert_eq!(run(&f.service, &[&cmd]).unwrap(), vec![ACCEPT]);
}

#[test]
fn delegation_auth_hex_encoded_name() {
    let f = fixture();
    let pwd = password(&f.owner, "Dömob", "chat");
    let cmd = format!("auth:x-44c3b66d6f62:chat.example:{pwd}");
    assert_eq!(run(&f.service, &[&cmd]).unwrap(), vec![ACCEPT]);
}

#[test]
fn auth_denials() {
    let f = fixture();
    let stranger = password(&SecpKeyPair::generate(), "domob", "chat");
    let wrong_app = password(&f.owner, "domob", "game");
    let good = password(&f.owner, "domob", "chat");

    let cmds = [
        format!("auth:domob:chat.example:{stranger}"),
        format!("auth:domob:chat.example:{wrong_app}"),
        format!("auth:Domob:chat.example:{good}"),
        format!("auth:domob:unknown.example:{good}"),
        "auth:domob:chat.example:not-base64!".to_string(),
        "auth:domob:chat.example".to_string(),
        "setpass:domob:chat.example:x".to_string(),
    ];
    let refs: Vec<&str> = cmds.iter().map(String::as_str).collect();
    assert_eq!(run(&f.service, &refs).unwrap(), vec![DENY; cmds.len()]);
}

#[test]
fn gsp_auth_on_any_authenticator() {
    let f = fixture();
    f.gsp.accept("andy", "chat", "gsp-token");
    f.gsp.accept("andy", "game", "game-token");

    let responses = run(
        &f.service,
        &[
            "auth:andy:chat.example:gsp-token",
            "auth:andy:gsp.example:game-token",
            "auth:andy:gsp.example:gsp-token",
        ],
    )
    .unwrap();
    assert_eq!(responses, vec![ACCEPT, ACCEPT, DENY]);
}

#[test]
fn isuser_commands() {
    let f = fixture();
    f.gsp.set_name_state(
        "andy",
        NameState {
            signers: vec![SignerEntry {
                application: Some("game".into()),
                addresses: vec!["0x0000000000000000000000000000000000000001".into()],
            }],
            ..NameState::default()
        },
    );

    let responses = run(
        &f.service,
        &[
            "isuser:domob:chat.example",
            "isuser:andy:gsp.example",
            "isuser:andy:chat.example",
            "isuser:nobody:gsp.example",
            "isuser:domob:unknown.example",
            "isuser:x-616263:chat.example",
        ],
    )
    .unwrap();
    assert_eq!(responses, vec![ACCEPT, ACCEPT, DENY, DENY, DENY, DENY]);
}

#[test]
fn stale_gsp_ends_the_loop() {
    let f = fixture();
    f.gsp.set_sync_state("catching-up", 10);

    let mut output = Vec::new();
    let err = bridge::run(
        &f.service,
        Cursor::new(frames(&["isuser:andy:gsp.example", "isuser:andy:gsp.example"])),
        &mut output,
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("catching-up"), "{err:#}");
    assert!(output.is_empty());
}

#[test]
fn transport_failure_ends_the_loop() {
    let f = fixture();
    let pwd = password(&f.owner, "domob", "chat");
    let good = format!("auth:domob:chat.example:{pwd}");

    f.ledger.set_failure(Some(TransportError::Timeout {
        endpoint: "http://node".into(),
    }));

    let mut output = Vec::new();
    let result = bridge::run(
        &f.service,
        Cursor::new(frames(&["isuser:nobody:unknown.example", &good])),
        &mut output,
    );
    assert!(result.is_err());
    assert_eq!(output, DENY.to_vec());
}

#[test]
fn probe_reports_stale_state_without_failing() {
    let f = fixture();
    f.gsp.set_sync_state("catching-up", 10);
    bridge::probe_backends(&f.service).unwrap();

    f.gsp.set_failure(Some(TransportError::Timeout {
        endpoint: "http://xid".into(),
    }));
    assert!(bridge::probe_backends(&f.service).is_err());
}
