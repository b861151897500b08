//! # Name Subcommand
//!
//! Converts between identity names and their chat (XMPP local part) form.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use xidauth_core::{decode_chat_name, encode_identity_name};

/// Arguments for `xidauth name`.
#[derive(Args, Debug)]
pub struct NameArgs {
    #[command(subcommand)]
    pub command: NameCommand,
}

#[derive(Subcommand, Debug)]
pub enum NameCommand {
    /// Print the chat name for an identity name.
    Encode {
        /// Identity name; may be empty or contain any Unicode.
        identity: String,
    },
    /// Print the identity name a chat name stands for.
    Decode {
        /// Chat name, e.g. `domob` or `x-c3a4`.
        chat: String,
    },
}

/// Execute the name subcommand.
pub fn run_name(args: &NameArgs) -> Result<u8> {
    println!("{}", convert(&args.command)?);
    Ok(0)
}

fn convert(cmd: &NameCommand) -> Result<String> {
    match cmd {
        NameCommand::Encode { identity } => Ok(encode_identity_name(identity)),
        NameCommand::Decode { chat } => {
            decode_chat_name(chat).with_context(|| format!("cannot decode {chat:?}"))
        }
    }
}
