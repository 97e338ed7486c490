use std::collections::{BTreeMap, HashMap};

use dashmap::DashMap;
use prefs_core::{Backend, BackendFeatures, Entry, Namespace, PrefsResult};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    namespaces: DashMap<Namespace, BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// Creates a new, empty `MemoryBackend`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of namespaces that have been opened or written to.
    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    fn features(&self) -> BackendFeatures {
        BackendFeatures {
            name: "memory",
            persistent: false,
            atomic_batches: true,
        }
    }

    /// Every name is valid; opening only registers the namespace.
    async fn open_namespace(&self, ns: &Namespace) -> PrefsResult<()> {
        self.namespaces.entry(ns.clone()).or_default();
        Ok(())
    }

    async fn get(&self, ns: &Namespace, key: &str) -> PrefsResult<Option<String>> {
        Ok(self
            .namespaces
            .get(ns)
            .and_then(|entries| entries.get(key).cloned()))
    }

    async fn set(&self, ns: &Namespace, key: &str, value: &str) -> PrefsResult<()> {
        self.namespaces
            .entry(ns.clone())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, ns: &Namespace, key: &str) -> PrefsResult<()> {
        if let Some(mut entries) = self.namespaces.get_mut(ns) {
            entries.remove(key);
        }
        Ok(())
    }

    async fn contains(&self, ns: &Namespace, key: &str) -> PrefsResult<bool> {
        Ok(self
            .namespaces
            .get(ns)
            .is_some_and(|entries| entries.contains_key(key)))
    }

    async fn get_all(&self, ns: &Namespace) -> PrefsResult<HashMap<String, String>> {
        Ok(self
            .namespaces
            .get(ns)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn clear_all(&self, ns: &Namespace) -> PrefsResult<()> {
        if let Some(mut entries) = self.namespaces.get_mut(ns) {
            entries.clear();
        }
        Ok(())
    }

    /// Applies the whole batch under a single shard lock.
    async fn set_many(&self, ns: &Namespace, entries: &[Entry]) -> PrefsResult<()> {
        let mut map = self.namespaces.entry(ns.clone()).or_default();
        for entry in entries {
            map.insert(entry.key.clone(), entry.value.clone());
        }
        Ok(())
    }

    async fn remove_many(&self, ns: &Namespace, keys: &[String]) -> PrefsResult<()> {
        if let Some(mut entries) = self.namespaces.get_mut(ns) {
            for key in keys {
                entries.remove(key);
            }
        }
        Ok(())
    }
}
