use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Namespace, PrefsResult};

/// A single key/value pair as written by batch operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for Entry {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Storage medium behind the [`Preferences`](crate::Preferences) facade.
///
/// Backends are stateless with respect to routing: every call names the
/// namespace it targets, and the facade owns the active selection.
/// `get_all` and `clear_all` must only see entries of that namespace's own
/// partition.
#[async_trait]
pub trait Backend: std::fmt::Debug + Send + Sync + 'static {
    fn features(&self) -> BackendFeatures;

    /// Opens (creating if needed) the partition for `ns`.
    ///
    /// Returns [`PrefsError::BackendUnavailable`](crate::PrefsError::BackendUnavailable)
    /// when the namespace cannot be represented by this backend.
    async fn open_namespace(&self, ns: &Namespace) -> PrefsResult<()>;

    async fn get(&self, ns: &Namespace, key: &str) -> PrefsResult<Option<String>>;

    async fn set(&self, ns: &Namespace, key: &str, value: &str) -> PrefsResult<()>;

    /// Removes `key`. Removing an absent key succeeds.
    async fn remove(&self, ns: &Namespace, key: &str) -> PrefsResult<()>;

    async fn contains(&self, ns: &Namespace, key: &str) -> PrefsResult<bool>;

    async fn get_all(&self, ns: &Namespace) -> PrefsResult<HashMap<String, String>>;

    async fn clear_all(&self, ns: &Namespace) -> PrefsResult<()>;

    /// Writes `entries` in order. Overrides must stay equivalent to calling
    /// [`Backend::set`] once per entry.
    async fn set_many(&self, ns: &Namespace, entries: &[Entry]) -> PrefsResult<()> {
        for entry in entries {
            self.set(ns, &entry.key, &entry.value).await?;
        }
        Ok(())
    }

    /// Removes `keys` in order. Overrides must stay equivalent to calling
    /// [`Backend::remove`] once per key.
    async fn remove_many(&self, ns: &Namespace, keys: &[String]) -> PrefsResult<()> {
        for key in keys {
            self.remove(ns, key).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFeatures {
    pub name: &'static str,
    /// Entries survive the process.
    pub persistent: bool,
    /// `set_many`/`remove_many` apply all-or-nothing.
    pub atomic_batches: bool,
}
