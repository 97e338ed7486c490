//! Preference backend that keeps one JSON settings file per namespace.
//!
//! Namespace `user_1` lives in `<base_path>/user_1.json`; the default
//! namespace uses `<base_path>/.<default_name>.json`. Named namespaces may not
//! start with a dot, so no name maps onto the default file. Each file belongs to
//! this backend alone, so clearing a namespace truncates only its file.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context;
use prefs_core::{Backend, BackendFeatures, Entry, Namespace, PrefsError, PrefsResult};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

const FILE_EXTENSION: &str = "json";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct LocalBackendConfig {
    pub base_path: String,
    /// File stem for the default namespace, stored with a leading dot.
    #[serde(default = "default_name")]
    pub default_name: String,
}

fn default_name() -> String {
    "default".to_string()
}

type Entries = BTreeMap<String, String>;

#[derive(Debug)]
pub struct LocalBackend {
    base_path: PathBuf,
    default_name: String,
    // serializes read-modify-write cycles; readers rely on atomic rename
    write_lock: Mutex<()>,
}

impl LocalBackend {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        LocalBackend {
            base_path: base_path.into(),
            default_name: default_name(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn create(config: LocalBackendConfig) -> Self {
        LocalBackend {
            base_path: config.base_path.into(),
            default_name: config.default_name,
            write_lock: Mutex::new(()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Maps a namespace to its settings file.
    ///
    /// Names must be usable as a single file name: no path separators, no
    /// NUL, and no leading dot. The leading dot is reserved for the default
    /// namespace.
    pub fn namespace_path(&self, ns: &Namespace) -> PrefsResult<PathBuf> {
        let stem = match ns.name() {
            Some(name) => {
                if name.contains(['/', '\\', '\0']) || name.starts_with('.') {
                    return Err(PrefsError::unavailable(
                        ns,
                        "namespace must be a plain file name without separators or a leading '.'",
                    ));
                }
                name.to_string()
            }
            None => format!(".{}", self.default_name),
        };
        Ok(self.base_path.join(format!("{stem}.{FILE_EXTENSION}")))
    }

    async fn read_entries(&self, path: &Path) -> PrefsResult<Entries> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("corrupt preferences file {}", path.display()))
            .map_err(PrefsError::backend)
    }

    /// Replaces the file through a temporary sibling and a rename.
    async fn write_entries(&self, path: &Path, entries: &Entries) -> PrefsResult<()> {
        tokio::fs::create_dir_all(&self.base_path).await?;

        let raw = serde_json::to_vec_pretty(entries).map_err(PrefsError::backend)?;
        let tmp_path = path.with_extension("tmp");
        let mut tmp = tokio::fs::File::create(&tmp_path).await?;
        tmp.write_all(&raw).await?;
        tmp.sync_all().await?;
        drop(tmp);
        tokio::fs::rename(&tmp_path, path)
            .await
            .with_context(|| format!("failed to replace {}", path.display()))
            .map_err(PrefsError::backend)?;
        Ok(())
    }

    async fn update<F>(&self, ns: &Namespace, apply: F) -> PrefsResult<()>
    where
        F: FnOnce(&mut Entries) -> bool + Send,
    {
        let path = self.namespace_path(ns)?;
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries(&path).await?;
        if apply(&mut entries) {
            self.write_entries(&path, &entries).await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Backend for LocalBackend {
    fn features(&self) -> BackendFeatures {
        BackendFeatures {
            name: "local",
            persistent: true,
            atomic_batches: true,
        }
    }

    async fn open_namespace(&self, ns: &Namespace) -> PrefsResult<()> {
        let path = self.namespace_path(ns)?;
        let _guard = self.write_lock.lock().await;
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| PrefsError::unavailable(ns, e))?;
        if exists {
            return Ok(());
        }
        debug!(path = %path.display(), "local prefs: creating namespace file");
        self.write_entries(&path, &Entries::new())
            .await
            .map_err(|e| PrefsError::unavailable(ns, e))
    }

    async fn get(&self, ns: &Namespace, key: &str) -> PrefsResult<Option<String>> {
        let path = self.namespace_path(ns)?;
        Ok(self.read_entries(&path).await?.remove(key))
    }

    async fn set(&self, ns: &Namespace, key: &str, value: &str) -> PrefsResult<()> {
        self.update(ns, |entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
        .await
    }

    async fn remove(&self, ns: &Namespace, key: &str) -> PrefsResult<()> {
        self.update(ns, |entries| entries.remove(key).is_some()).await
    }

    async fn contains(&self, ns: &Namespace, key: &str) -> PrefsResult<bool> {
        let path = self.namespace_path(ns)?;
        Ok(self.read_entries(&path).await?.contains_key(key))
    }

    async fn get_all(&self, ns: &Namespace) -> PrefsResult<HashMap<String, String>> {
        let path = self.namespace_path(ns)?;
        Ok(self.read_entries(&path).await?.into_iter().collect())
    }

    async fn clear_all(&self, ns: &Namespace) -> PrefsResult<()> {
        self.update(ns, |entries| {
            let changed = !entries.is_empty();
            entries.clear();
            changed
        })
        .await
    }

    /// Writes the file once for the whole batch.
    async fn set_many(&self, ns: &Namespace, batch: &[Entry]) -> PrefsResult<()> {
        self.update(ns, |entries| {
            for entry in batch {
                entries.insert(entry.key.clone(), entry.value.clone());
            }
            !batch.is_empty()
        })
        .await
    }

    async fn remove_many(&self, ns: &Namespace, keys: &[String]) -> PrefsResult<()> {
        self.update(ns, |entries| {
            let before = entries.len();
            for key in keys {
                entries.remove(key);
            }
            entries.len() != before
        })
        .await
    }
}
