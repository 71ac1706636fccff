use std::sync::Arc;

use anyhow::{bail, Context};
use coffer::{Chest, Coffer, CofferConfig, XChaChaEncryption};
use colored::Colorize;
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;

/// What a command did, rendered afterwards in the requested format.
#[derive(Debug, PartialEq)]
pub enum Report {
    Stored { key: String },
    Value { key: String, logical_type: Option<String>, value: Value },
    Exists { key: String, exists: bool },
    Deleted { key: String, existed: bool },
    Keys(Vec<String>),
    Cleared { deleted: usize },
    Destroyed { chest: String },
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let report = execute(&cli)?;
    print_report(&report, &cli.format)
}

pub fn execute(cli: &Cli) -> anyhow::Result<Report> {
    let chest = open_chest(cli)?;
    let report = match &cli.command {
        Command::Put { key, value, string } => {
            let value = if *string {
                Value::String(value.clone())
            } else {
                serde_json::from_str(value).with_context(|| format!("invalid JSON for {key}"))?
            };
            chest.write(key, value)?;
            Report::Stored { key: key.clone() }
        }
        Command::Get { key } => {
            let Some(value) = chest.read::<Value>(key)? else {
                bail!("no entry for {key:?} in chest {:?}", chest.name());
            };
            Report::Value {
                key: key.clone(),
                logical_type: chest.storage().logical_type(key)?,
                value: Value::clone(&value),
            }
        }
        Command::Exists { key } => Report::Exists {
            key: key.clone(),
            exists: chest.exist(key)?,
        },
        Command::Delete { key } => Report::Deleted {
            key: key.clone(),
            existed: chest.delete(key)?,
        },
        Command::Keys => Report::Keys(chest.all_keys()?),
        Command::Clear => Report::Cleared {
            deleted: chest.delete_all()?,
        },
        Command::Destroy { yes } => {
            if !yes {
                bail!("refusing to destroy chest {:?} without --yes", chest.name());
            }
            chest.destroy()?;
            Report::Destroyed {
                chest: chest.name().to_string(),
            }
        }
    };
    Ok(report)
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<CofferConfig> {
    let mut config = match &cli.config {
        Some(path) => CofferConfig::load(path)?,
        None => CofferConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(cache) = cli.cache {
        config.cache_capacity = cache;
    }
    Ok(config)
}

fn open_chest(cli: &Cli) -> anyhow::Result<Arc<Chest>> {
    let config = load_config(cli)?;
    debug!(?config, chest = %cli.chest, "opening");
    let mut coffer = Coffer::new(config);
    if let Some(passphrase) = &cli.passphrase {
        coffer = coffer.with_encryption(Arc::new(XChaChaEncryption::from_passphrase(passphrase)));
    }
    Ok(coffer.chest(&cli.chest)?)
}

fn print_report(report: &Report, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report_json(report))?),
        OutputFormat::Text => print_text(report)?,
    }
    Ok(())
}

fn report_json(report: &Report) -> Value {
    match report {
        Report::Stored { key } => json!({ "stored": key }),
        Report::Value {
            key,
            logical_type,
            value,
        } => json!({ "key": key, "type": logical_type, "value": value }),
        Report::Exists { key, exists } => json!({ "key": key, "exists": exists }),
        Report::Deleted { key, existed } => json!({ "key": key, "deleted": existed }),
        Report::Keys(keys) => json!(keys),
        Report::Cleared { deleted } => json!({ "deleted": deleted }),
        Report::Destroyed { chest } => json!({ "destroyed": chest }),
    }
}

fn print_text(report: &Report) -> anyhow::Result<()> {
    match report {
        Report::Stored { key } => println!("{} Stored {}", "✓".green().bold(), key.bold()),
        Report::Value {
            key,
            logical_type,
            value,
        } => {
            let ty = logical_type.as_deref().unwrap_or("unknown");
            println!("{} {}", key.bold(), format!("({ty})").dimmed());
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        Report::Exists { key, exists: true } => println!("{} exists", key.bold()),
        Report::Exists { key, exists: false } => println!("{} {}", key.bold(), "not found".yellow()),
        Report::Deleted { key, existed: true } => {
            println!("{} Deleted {}", "✓".green().bold(), key.bold())
        }
        Report::Deleted { key, existed: false } => {
            println!("{} was not present", key.bold())
        }
        Report::Keys(keys) if keys.is_empty() => println!("No keys."),
        Report::Keys(keys) => {
            for key in keys {
                println!("{key}");
            }
        }
        Report::Cleared { deleted } => {
            println!("{} Deleted {} entries", "✓".green().bold(), deleted)
        }
        Report::Destroyed { chest } => {
            println!("{} Destroyed chest {}", "✓".green().bold(), chest.yellow())
        }
    }
    Ok(())
}
