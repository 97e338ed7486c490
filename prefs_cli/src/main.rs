use crate::init_config::CmdConfig;
use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;
use directories::ProjectDirs;
use prefs_core::Entry;
use std::path::PathBuf;
use std::process::ExitCode;

mod cmd;
mod config;
mod init_config;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// config file to use instead of the platform default
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// namespace to operate on; omit for the default namespace
    #[arg(short, long, value_name = "NAME")]
    namespace: Option<String>,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Modify or inspect the config file
    Config {
        #[command(subcommand)]
        cmd: CmdConfig,
    },
    /// Print the value stored under a key (exits with 1 if absent)
    Get { key: String },
    /// Store a value under a key (an empty value is ignored)
    Set { key: String, value: String },
    /// Remove a key
    Clear { key: String },
    /// Print whether a key has a value
    Contains { key: String },
    /// Print every entry of the namespace as JSON
    List,
    /// Remove every entry of the namespace
    ClearAll,
    /// Store several KEY=VALUE pairs; pairs with an empty key or value are skipped
    SetMany {
        #[arg(value_name = "KEY=VALUE", value_parser = parse_entry, required = true)]
        entries: Vec<Entry>,
    },
    /// Print several keys as a JSON object (null for absent keys)
    GetMany {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Remove several keys
    ClearMany {
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

fn parse_entry(s: &str) -> Result<Entry, String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    Ok(Entry::new(key, value))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    // Default layout:
    // - Config: ~/.config/prefs/prefs.toml
    // - Data:   ~/.local/share/prefs/
    let dirs =
        ProjectDirs::from("", "", "prefs").context("failed to determine config directory path")?;

    let config_file = cli
        .config
        .unwrap_or_else(|| dirs.config_dir().join("prefs.toml"));
    let local_data_dir = dirs.data_dir();

    cmd::run_command(config_file, local_data_dir, cli.namespace.as_deref(), cli.cmd).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_entry_splits_on_first_equals() {
        assert_eq!(parse_entry("a=b=c").unwrap(), Entry::new("a", "b=c"));
        assert_eq!(parse_entry("blank=").unwrap(), Entry::new("blank", ""));
        assert!(parse_entry("novalue").is_err());
    }

    #[test]
    fn global_namespace_flag_parses() {
        let cli = Cli::try_parse_from(["prefs", "-n", "user_1", "set-many", "a=1", "b=2"]).unwrap();
        assert_eq!(cli.namespace.as_deref(), Some("user_1"));
        match cli.cmd {
            Commands::SetMany { entries } => assert_eq!(entries.len(), 2),
            _ => panic!("expected set-many"),
        }
    }
}
