use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use prefs_backend_local::{LocalBackend, LocalBackendConfig};
use prefs_backend_memory::MemoryBackend;
use prefs_backend_redb::{RedbBackend, RedbBackendConfig};
use prefs_core::Backend;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrefsConfig {
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum BackendConfig {
    Memory,
    Local(LocalBackendConfig),
    Redb(RedbBackendConfig),
}

impl PrefsConfig {
    /// Config used when no config file exists yet: JSON files under the data dir.
    pub fn default_for(data_dir: &Path) -> Self {
        Self {
            backend: BackendConfig::Local(LocalBackendConfig {
                base_path: data_dir.join("prefs").to_string_lossy().into_owned(),
                default_name: "default".to_string(),
            }),
        }
    }

    pub fn load(config_file: &Path, data_dir: &Path) -> Result<Self> {
        if !config_file.exists() {
            info!("no config file at {config_file:?}, using local defaults");
            return Ok(Self::default_for(data_dir));
        }
        let toml_content = std::fs::read_to_string(config_file)?;
        toml::from_str(&toml_content)
            .with_context(|| format!("could not parse config file {config_file:?}"))
    }
}

pub fn open_backend(config: &BackendConfig) -> Result<Arc<dyn Backend>> {
    let backend: Arc<dyn Backend> = match config {
        BackendConfig::Memory => Arc::new(MemoryBackend::new()),
        BackendConfig::Local(config) => Arc::new(LocalBackend::create(config.clone())),
        BackendConfig::Redb(config) => Arc::new(
            RedbBackend::create(config.clone())
                .with_context(|| format!("failed to open redb database in {}", config.base_path))?,
        ),
    };
    Ok(backend)
}
