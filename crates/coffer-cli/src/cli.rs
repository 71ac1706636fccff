use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "coffer",
    about = "Coffer: inspect and edit local object stores",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the chests (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Chest to operate on
    #[arg(short, long, global = true, default_value = "default")]
    pub chest: String,

    /// Cache capacity (overrides the config file)
    #[arg(long, global = true)]
    pub cache: Option<usize>,

    /// Encrypt entries with a key derived from this passphrase
    #[arg(long, global = true)]
    pub passphrase: Option<String>,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Store a JSON value under a key
    Put {
        key: String,
        /// JSON text; with --string, stored verbatim as a string
        value: String,
        #[arg(long)]
        string: bool,
    },
    /// Print the value under a key
    Get { key: String },
    /// Report whether a key exists
    Exists { key: String },
    /// Delete a key
    Delete { key: String },
    /// List all keys
    Keys,
    /// Delete every entry in the chest
    Clear,
    /// Remove the chest directory
    Destroy {
        /// Required; destroying cannot be undone
        #[arg(long)]
        yes: bool,
    },
}
