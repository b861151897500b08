//! # xidauth CLI entry point
//!
//! Parses command-line arguments, initialises logging and dispatches to the
//! subcommand handlers.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xidauth_cli::bridge::{run_bridge, BridgeArgs};
use xidauth_cli::config::ServiceConfig;
use xidauth_cli::name::{run_name, NameArgs};
use xidauth_cli::password::{run_password, PasswordArgs};
use xidauth_cli::serve::{run_serve, ServeArgs};

/// Authenticate XMPP logins against xid identities and delegation grants.
#[derive(Parser, Debug)]
#[command(name = "xidauth", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON service map; defaults to the EJABBERD_XIDAUTH_CONFIG variable.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// ejabberd external-auth bridge on stdin/stdout.
    Bridge(BridgeArgs),

    /// Serve the decision API over HTTP.
    Serve(ServeArgs),

    /// Build and sign a delegation-contract password.
    Password(PasswordArgs),

    /// Convert between identity names and chat names.
    Name(NameArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout is the wire protocol for the bridge, so it logs to a file.
    let logging = match &cli.command {
        Commands::Bridge(args) => init_file_logging(&args.logfile, args.debug),
        _ => {
            init_stderr_logging(cli.verbose);
            Ok(())
        }
    };
    if let Err(e) = logging {
        eprintln!("xidauth: {e:#}");
        return ExitCode::from(1);
    }

    tracing::debug!("xidauth CLI starting");

    let result = match cli.command {
        Commands::Bridge(_) => {
            ServiceConfig::load(cli.config.as_deref()).and_then(run_bridge)
        }
        Commands::Serve(args) => {
            ServiceConfig::load(cli.config.as_deref()).and_then(|c| run_serve(&args, c))
        }
        Commands::Password(args) => run_password(&args),
        Commands::Name(args) => run_name(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("xidauth: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_stderr_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn init_file_logging(path: &Path, debug: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file: {}", path.display()))?;

    let filter = EnvFilter::new(if debug { "debug" } else { "info" });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_bridge_defaults() {
        let cli = Cli::try_parse_from(["xidauth", "bridge"]).unwrap();
        if let Commands::Bridge(args) = cli.command {
            assert_eq!(args.logfile, PathBuf::from("/var/log/ejabberd/xidauth.log"));
            assert!(!args.debug);
        } else {
            panic!("expected bridge");
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn cli_parse_bridge_options() {
        let cli = Cli::try_parse_from([
            "xidauth",
            "--config",
            "services.json",
            "bridge",
            "--logfile",
            "/tmp/x.log",
            "--debug",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("services.json")));
        if let Commands::Bridge(args) = cli.command {
            assert_eq!(args.logfile, PathBuf::from("/tmp/x.log"));
            assert!(args.debug);
        } else {
            panic!("expected bridge");
        }
    }

    #[test]
    fn cli_parse_serve_default_listen() {
        let cli = Cli::try_parse_from(["xidauth", "serve"]).unwrap();
        if let Commands::Serve(args) = cli.command {
            assert_eq!(args.listen.to_string(), "127.0.0.1:8400");
            assert!(!args.no_metrics);
        } else {
            panic!("expected serve");
        }
    }

    #[test]
    fn cli_parse_password() {
        let cli = Cli::try_parse_from([
            "xidauth",
            "password",
            "--name",
            "domob",
            "--app",
            "chat",
            "--key",
            "key.hex",
            "--chain-id",
            "137",
            "--contract",
            "0xEB4c2EF7874628B646B8A59e4A309B94e14C2a6B",
            "--valid-for",
            "3600",
            "--extra",
            "a=b",
            "--extra",
            "c=d",
        ])
        .unwrap();
        if let Commands::Password(args) = cli.command {
            assert_eq!(args.chain_id, 137);
            assert_eq!(args.valid_for, Some(3600));
            assert_eq!(args.extra, vec!["a=b", "c=d"]);
        } else {
            panic!("expected password");
        }
    }

    #[test]
    fn cli_parse_password_rejects_bad_contract() {
        assert!(Cli::try_parse_from([
            "xidauth", "password", "--name", "d", "--app", "a", "--key", "k",
            "--chain-id", "1", "--contract", "0x12",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_password_expiry_conflicts() {
        assert!(Cli::try_parse_from([
            "xidauth", "password", "--name", "d", "--app", "a", "--key", "k",
            "--chain-id", "1", "--contract", "0xEB4c2EF7874628B646B8A59e4A309B94e14C2a6B",
            "--expiry", "5", "--valid-for", "5",
        ])
        .is_err());
    }

    #[test]
    fn cli_parse_name() {
        let cli = Cli::try_parse_from(["xidauth", "name", "decode", "x-c3a4"]).unwrap();
        assert!(matches!(cli.command, Commands::Name(_)));
        let cli = Cli::try_parse_from(["xidauth", "name", "encode", ""]).unwrap();
        assert!(matches!(cli.command, Commands::Name(_)));
    }

    #[test]
    fn cli_verbose_counts() {
        let cli = Cli::try_parse_from(["xidauth", "-vv", "name", "encode", "a"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
