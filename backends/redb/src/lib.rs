//! RedbBackend - a preference suite stored in a single redb database.
//!
//! Each namespace maps to its own table (`ns:` for the default namespace,
//! `ns:<name>` otherwise). Only tables carrying that prefix are ever read or
//! cleared, so other data kept in the same database file is left alone.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::anyhow;
use prefs_core::{Backend, BackendFeatures, Entry, Namespace, PrefsError, PrefsResult};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use tracing::debug;

const TABLE_PREFIX: &str = "ns:";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct RedbBackendConfig {
    pub base_path: String,
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_file_name() -> String {
    "prefs.redb".to_string()
}

/// Preference backend backed by a Redb database.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Opens (or creates) `prefs.redb` inside `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::open_file(path.as_ref().join(default_file_name()))
    }

    pub fn create(config: RedbBackendConfig) -> anyhow::Result<Self> {
        let base_path = Path::new(&config.base_path);
        std::fs::create_dir_all(base_path)?;
        Self::open_file(base_path.join(&config.file_name))
    }

    fn open_file(file: impl AsRef<Path>) -> anyhow::Result<Self> {
        let db = Database::create(file.as_ref())?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Runs a blocking database operation off the async runtime.
    async fn run<T, F>(&self, op: &'static str, f: F) -> PrefsResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| PrefsError::backend(anyhow!("redb {op} task failed: {e}")))?
            .map_err(PrefsError::backend)
    }
}

fn table_name(ns: &Namespace) -> String {
    format!("{TABLE_PREFIX}{}", ns.name().unwrap_or_default())
}

fn table(name: &str) -> TableDefinition<'_, &'static str, &'static str> {
    TableDefinition::new(name)
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend").finish()
    }
}

#[async_trait::async_trait]
impl Backend for RedbBackend {
    fn features(&self) -> BackendFeatures {
        BackendFeatures {
            name: "redb",
            persistent: true,
            atomic_batches: true,
        }
    }

    async fn open_namespace(&self, ns: &Namespace) -> PrefsResult<()> {
        let name = table_name(ns);
        debug!(table = %name, "redb prefs: opening namespace table");
        self.run("open", move |db| {
            let write_txn = db.begin_write()?;
            {
                // `open_table` on a write transaction creates the table
                // if it does not already exist.
                let _ = write_txn.open_table(table(&name))?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
        .map_err(|e| PrefsError::unavailable(ns, e))
    }

    async fn get(&self, ns: &Namespace, key: &str) -> PrefsResult<Option<String>> {
        let name = table_name(ns);
        let key = key.to_string();
        self.run("read", move |db| {
            let read_txn = db.begin_read()?;
            let table = match read_txn.open_table(table(&name)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            Ok(table.get(key.as_str())?.map(|guard| guard.value().to_string()))
        })
        .await
    }

    async fn set(&self, ns: &Namespace, key: &str, value: &str) -> PrefsResult<()> {
        self.set_many(ns, &[Entry::new(key, value)]).await
    }

    async fn remove(&self, ns: &Namespace, key: &str) -> PrefsResult<()> {
        self.remove_many(ns, &[key.to_string()]).await
    }

    async fn contains(&self, ns: &Namespace, key: &str) -> PrefsResult<bool> {
        Ok(self.get(ns, key).await?.is_some())
    }

    async fn get_all(&self, ns: &Namespace) -> PrefsResult<HashMap<String, String>> {
        let name = table_name(ns);
        self.run("list", move |db| {
            let read_txn = db.begin_read()?;
            let table = match read_txn.open_table(table(&name)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(HashMap::new()),
                Err(e) => return Err(e.into()),
            };
            let mut entries = HashMap::new();
            for item in table.iter()? {
                let (key, value) = item?;
                entries.insert(key.value().to_string(), value.value().to_string());
            }
            Ok(entries)
        })
        .await
    }

    async fn clear_all(&self, ns: &Namespace) -> PrefsResult<()> {
        let name = table_name(ns);
        self.run("clear", move |db| {
            let write_txn = db.begin_write()?;
            write_txn.delete_table(table(&name))?;
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    /// Commits the whole batch in one write transaction.
    async fn set_many(&self, ns: &Namespace, entries: &[Entry]) -> PrefsResult<()> {
        let name = table_name(ns);
        let entries = entries.to_vec();
        self.run("write", move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(table(&name))?;
                for entry in &entries {
                    table.insert(entry.key.as_str(), entry.value.as_str())?;
                }
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn remove_many(&self, ns: &Namespace, keys: &[String]) -> PrefsResult<()> {
        let name = table_name(ns);
        let keys = keys.to_vec();
        self.run("delete", move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(table(&name))?;
                for key in &keys {
                    table.remove(key.as_str())?;
                }
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }
}
