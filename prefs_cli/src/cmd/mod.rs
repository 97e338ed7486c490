use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use prefs_core::Preferences;

use crate::config::{PrefsConfig, open_backend};

pub async fn run_command(
    config_file: PathBuf,
    local_data_dir: &Path,
    namespace: Option<&str>,
    cmd: crate::Commands,
) -> Result<ExitCode> {
    if let crate::Commands::Config { cmd } = cmd {
        cmd.run(config_file, local_data_dir)?;
        return Ok(ExitCode::SUCCESS);
    }

    let config = PrefsConfig::load(&config_file, local_data_dir)?;
    let backend = open_backend(&config.backend)?;
    let prefs = Preferences::open(backend, namespace).await?;

    if run_prefs(&prefs, cmd).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Runs one key command. Returns `false` when a looked-up key is absent.
async fn run_prefs(prefs: &Preferences, cmd: crate::Commands) -> Result<bool> {
    match cmd {
        crate::Commands::Get { key } => match prefs.get(&key).await? {
            Some(value) => println!("{value}"),
            None => return Ok(false),
        },
        crate::Commands::Set { key, value } => prefs.set(&key, &value).await?,
        crate::Commands::Clear { key } => prefs.clear(&key).await?,
        crate::Commands::Contains { key } => println!("{}", prefs.contains(&key).await?),
        crate::Commands::List => {
            let entries: BTreeMap<_, _> = prefs.get_all().await?.into_iter().collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        crate::Commands::ClearAll => prefs.clear_all().await?,
        crate::Commands::SetMany { entries } => prefs.set_multiple(entries).await?,
        crate::Commands::GetMany { keys } => {
            let values: BTreeMap<_, _> = prefs.get_multiple(&keys).await?.into_iter().collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        crate::Commands::ClearMany { keys } => prefs.clear_multiple(&keys).await?,
        crate::Commands::Config { .. } => unreachable!(),
    }
    Ok(true)
}
