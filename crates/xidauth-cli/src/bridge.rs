//! # ejabberd External-Auth Bridge
//!
//! Speaks ejabberd's `extauth` protocol on stdin/stdout.
//!
//! ## Wire Format
//!
//! Requests are a 2-byte big-endian length followed by that many ASCII
//! bytes holding a colon-separated command:
//!
//! ```text
//! auth:<chatName>:<server>:<password>
//! isuser:<chatName>:<server>
//! ```
//!
//! Every request gets exactly one response: two 2-byte big-endian integers,
//! `2` and then `1` (accept) or `0` (deny). Unsupported or malformed
//! commands are denied.
//!
//! ## Failure Policy
//!
//! Denials (bad name, bad password, no permission, unknown server) answer
//! `0`. Backend failures and a stale game-state processor end the loop with
//! an error instead, so ejabberd sees the process exit rather than a
//! silent denial.

use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use xidauth_verify::{AuthService, Authenticator, VerifyError};

use crate::config::ServiceConfig;
use crate::service_span;

/// Default log file; stdout carries the wire protocol.
pub const DEFAULT_LOGFILE: &str = "/var/log/ejabberd/xidauth.log";

/// Name queried once at startup to report the processor's sync state.
pub const PROBE_NAME: &str = "xaya";

/// Arguments for `xidauth bridge`.
#[derive(Args, Debug)]
pub struct BridgeArgs {
    /// File to write logs to.
    #[arg(long, default_value = DEFAULT_LOGFILE)]
    pub logfile: PathBuf,

    /// Turn on debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// One parsed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Auth {
        name: String,
        server: String,
        password: String,
    },
    IsUser {
        name: String,
        server: String,
    },
    /// Anything we do not serve; carries the operation for logging.
    Unsupported(String),
    /// A known operation with the wrong number of fields.
    Invalid(String),
}

impl Command {
    /// Parse a command line.
    ///
    /// The password is everything after the third colon, so passwords may
    /// themselves contain colons.
    pub fn parse(line: &str) -> Self {
        let (op, rest) = line.split_once(':').unwrap_or((line, ""));
        match op {
            "auth" => {
                let fields: Vec<&str> = rest.splitn(3, ':').collect();
                match fields.as_slice() {
                    [name, server, password] => Self::Auth {
                        name: name.to_string(),
                        server: server.to_string(),
                        password: password.to_string(),
                    },
                    _ => Self::Invalid(op.to_string()),
                }
            }
            "isuser" => {
                let fields: Vec<&str> = rest.split(':').collect();
                match fields.as_slice() {
                    [name, server] => Self::IsUser {
                        name: name.to_string(),
                        server: server.to_string(),
                    },
                    _ => Self::Invalid(op.to_string()),
                }
            }
            other => Self::Unsupported(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

/// Read one framed command. `None` on a clean end of input.
pub fn read_command<R: Read>(input: &mut R) -> Result<Option<String>> {
    let mut len = [0u8; 2];
    match input.read_exact(&mut len) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("failed to read command length"),
    }

    let n = i16::from_be_bytes(len);
    if n < 0 {
        bail!("negative command length {n}");
    }

    let mut buf = vec![0u8; n as usize];
    input
        .read_exact(&mut buf)
        .with_context(|| format!("failed to read {n}-byte command"))?;

    // Non-ASCII bytes cannot form a valid command; map them to a denial.
    if !buf.is_ascii() {
        return Ok(Some(String::from("invalid:non-ascii")));
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Write the response for one command.
pub fn write_result<W: Write>(output: &mut W, ok: bool) -> Result<()> {
    let mut data = [0u8; 4];
    data[..2].copy_from_slice(&2i16.to_be_bytes());
    data[2..].copy_from_slice(&i16::from(ok).to_be_bytes());
    output
        .write_all(&data)
        .and_then(|()| output.flush())
        .context("failed to write result")
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Answer one command. Only fatal errors are returned.
pub fn handle(service: &AuthService, cmd: &Command) -> Result<bool, VerifyError> {
    let result = match cmd {
        Command::Auth {
            name,
            server,
            password,
        } => service
            .authenticate(name, server, password)
            .map(|d| d.valid),
        Command::IsUser { name, server } => service.is_user(name, server),
        Command::Unsupported(op) => {
            tracing::warn!(op = %op, "ignoring unsupported command");
            Ok(false)
        }
        Command::Invalid(op) => {
            tracing::warn!(op = %op, "wrong number of fields in command");
            Ok(false)
        }
    };

    match result {
        Err(e) if !e.is_fatal() => Ok(false),
        other => other,
    }
}

/// Log the sync state of every game-state processor.
pub fn probe_backends(service: &AuthService) -> Result<(), VerifyError> {
    for (server, srv) in service.servers() {
        for auth in srv.authenticators() {
            if let Authenticator::Gsp(gsp) = auth {
                let (state, height) = gsp.probe(PROBE_NAME)?;
                tracing::info!(server, state = %state, height = ?height, "xid sync state");
            }
        }
    }
    Ok(())
}

/// Connect the configured backends and serve stdin/stdout until stdin closes.
///
/// Oracle calls block on the runtime, so the loop runs on the blocking pool.
pub fn run_bridge(config: ServiceConfig) -> Result<u8> {
    let rt = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    rt.block_on(async move {
        tokio::task::spawn_blocking(move || -> Result<()> {
            let service = config.build(&service_span(), None)?;
            probe_backends(&service).context("startup probe failed")?;
            run(&service, std::io::stdin().lock(), std::io::stdout().lock())
        })
        .await
        .context("bridge task failed")?
    })?;
    Ok(0)
}

/// Serve commands from `input` until it is closed.
pub fn run<R: Read, W: Write>(service: &AuthService, mut input: R, mut output: W) -> Result<()> {
    service.log_servers();
    tracing::info!("starting main loop");

    while let Some(line) = read_command(&mut input)? {
        let cmd = Command::parse(&line);
        match &cmd {
            Command::Auth { name, server, .. } => {
                tracing::debug!(name = %name, server = %server, "got auth command")
            }
            Command::IsUser { name, server } => {
                tracing::debug!(name = %name, server = %server, "got isuser command")
            }
            _ => {}
        }

        let ok = handle(service, &cmd).context("verification backend failed")?;
        tracing::debug!(ok, "writing result");
        write_result(&mut output, ok)?;
    }

    tracing::info!("input closed, exiting");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame(cmd: &str) -> Vec<u8> {
        let mut out = (cmd.len() as i16).to_be_bytes().to_vec();
        out.extend_from_slice(cmd.as_bytes());
        out
    }

    #[test]
    fn test_parse_auth() {
        assert_eq!(
            Command::parse("auth:domob:chat.example:c2VjcmV0"),
            Command::Auth {
                name: "domob".into(),
                server: "chat.example".into(),
                password: "c2VjcmV0".into(),
            }
        );
    }

    #[test]
    fn test_parse_auth_password_with_colons() {
        match Command::parse("auth:domob:chat.example:a:b:c") {
            Command::Auth { password, .. } => assert_eq!(password, "a:b:c"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_isuser() {
        assert_eq!(
            Command::parse("isuser:x-c3a4:chat.example"),
            Command::IsUser {
                name: "x-c3a4".into(),
                server: "chat.example".into(),
            }
        );
    }

    #[test]
    fn test_parse_wrong_arity() {
        assert_eq!(Command::parse("auth:domob:chat"), Command::Invalid("auth".into()));
        assert_eq!(
            Command::parse("isuser:domob:chat:extra"),
            Command::Invalid("isuser".into())
        );
        assert_eq!(Command::parse("isuser"), Command::Invalid("isuser".into()));
    }

    #[test]
    fn test_parse_unsupported() {
        assert_eq!(
            Command::parse("setpass:domob:chat:pwd"),
            Command::Unsupported("setpass".into())
        );
        assert_eq!(Command::parse(""), Command::Unsupported(String::new()));
    }

    #[test]
    fn test_read_command_frames() {
        let mut data = frame("isuser:domob:chat");
        data.extend(frame("auth:a:b:c"));
        let mut input = Cursor::new(data);
        assert_eq!(
            read_command(&mut input).unwrap().as_deref(),
            Some("isuser:domob:chat")
        );
        assert_eq!(read_command(&mut input).unwrap().as_deref(), Some("auth:a:b:c"));
        assert_eq!(read_command(&mut input).unwrap(), None);
    }

    #[test]
    fn test_read_command_truncated_body() {
        let mut data = frame("isuser:domob:chat");
        data.truncate(6);
        assert!(read_command(&mut Cursor::new(data)).is_err());
    }

    #[test]
    fn test_read_command_negative_length() {
        let data = vec![0xff, 0xff, b'a'];
        assert!(read_command(&mut Cursor::new(data)).is_err());
    }

    #[test]
    fn test_read_command_non_ascii_is_denied() {
        let body = "auth:äb:c:d".as_bytes();
        let mut data = (body.len() as i16).to_be_bytes().to_vec();
        data.extend_from_slice(body);
        let line = read_command(&mut Cursor::new(data)).unwrap().unwrap();
        assert!(matches!(Command::parse(&line), Command::Unsupported(_)));
    }

    #[test]
    fn test_write_result() {
        let mut out = Vec::new();
        write_result(&mut out, true).unwrap();
        write_result(&mut out, false).unwrap();
        assert_eq!(out, vec![0, 2, 0, 1, 0, 2, 0, 0]);
    }
}
