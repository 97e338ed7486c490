use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Subcommand;
use toml_edit::{DocumentMut, Item, Table};
use tracing::info;

use crate::config::PrefsConfig;

#[derive(Subcommand)]
pub enum CmdConfig {
    /// Creates the config file if it doesn't exist and sets up a local backend
    Init,
    /// Prints the config that commands will use
    Show,
}

impl CmdConfig {
    pub fn run(self, config_file: PathBuf, local_data_dir: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init => init(config_file, local_data_dir),
            Self::Show => {
                let config = PrefsConfig::load(&config_file, local_data_dir)?;
                print!("{}", toml::to_string_pretty(&config)?);
                Ok(())
            }
        }
    }
}

fn init(config_file: PathBuf, local_data_dir: &Path) -> anyhow::Result<()> {
    let mut doc = if config_file.exists() {
        fs::read_to_string(&config_file)?
    } else {
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent)?;
        }
        "".to_owned()
    }
    .parse::<DocumentMut>()
    .context("could not parse config file")?;

    if doc.contains_key("backend") {
        info!("config file {config_file:?} already has a backend, leaving it unchanged");
        return Ok(());
    }

    let base_path = local_data_dir.join("prefs");
    let mut backend_table = Table::new();
    backend_table.insert("type", "local".into());
    backend_table.insert("base_path", base_path.to_string_lossy().into_owned().into());
    backend_table.insert("default_name", "default".into());
    doc.insert("backend", Item::Table(backend_table));

    info!("writing to config file {config_file:?}");

    let tmp_path = config_file.with_extension("tmp");
    let mut tmp = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;
    tmp.write_all(doc.to_string().as_bytes())?;
    tmp.sync_all()?;
    fs::rename(&tmp_path, config_file)?;
    Ok(())
}
