use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::{Backend, Entry, Namespace, PrefsError, PrefsResult};

/// Namespace-aware key-value API built on top of a generic [`Backend`].
///
/// A `Preferences` instance owns exactly one piece of state: the active
/// [`Namespace`]. Every key operation targets the namespace that is active
/// when the call starts and goes straight to the backend; nothing is cached.
///
/// Batch operations are thin groupings of the single-key primitives and are
/// applied sequentially in slice order, so for duplicate keys the last entry
/// wins.
#[derive(Debug)]
pub struct Preferences {
    backend: Arc<dyn Backend>,
    namespace: RwLock<Namespace>,
}

impl Preferences {
    /// Create a facade over `backend` with the default namespace selected.
    pub fn new<B>(backend: B) -> Self
    where
        B: Backend + 'static,
    {
        Self::from_arc(Arc::new(backend))
    }

    /// Create a facade over a shared backend.
    pub fn from_arc(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            namespace: RwLock::new(Namespace::Default),
        }
    }

    /// Create a facade and immediately select `namespace`.
    pub async fn open(backend: Arc<dyn Backend>, namespace: Option<&str>) -> PrefsResult<Self> {
        let prefs = Self::from_arc(backend);
        prefs.select_namespace(namespace).await?;
        Ok(prefs)
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Returns the currently selected namespace.
    pub async fn namespace(&self) -> Namespace {
        self.namespace.read().await.clone()
    }

    /// Switches the active namespace. `None` or `""` selects the default one.
    ///
    /// Selecting the namespace that is already active does not reach the
    /// backend. If the backend cannot open the new namespace, the previous
    /// selection is kept.
    pub async fn select_namespace(&self, name: Option<&str>) -> PrefsResult<()> {
        let next = Namespace::from_option(name);
        if *self.namespace.read().await == next {
            return Ok(());
        }

        self.backend.open_namespace(&next).await?;
        debug!(namespace = %next, backend = self.backend.features().name, "prefs: namespace selected");
        *self.namespace.write().await = next;
        Ok(())
    }

    /// Returns the value stored under `key`, or `None` if there is none.
    pub async fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        if key.is_empty() {
            return Ok(None);
        }
        let ns = self.namespace().await;
        self.backend.get(&ns, key).await
    }

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// Empty keys are rejected with [`PrefsError::InvalidKey`]. An empty value
    /// is ignored and leaves the stored entry unchanged, the same way
    /// [`Preferences::set_multiple`] skips it.
    pub async fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        ensure_key(key)?;
        if value.is_empty() {
            debug!(key, "prefs: ignoring empty value");
            return Ok(());
        }
        let ns = self.namespace().await;
        debug!(namespace = %ns, key, "prefs: set");
        self.backend.set(&ns, key, value).await
    }

    /// Removes `key`. Removing a key that does not exist succeeds.
    pub async fn clear(&self, key: &str) -> PrefsResult<()> {
        ensure_key(key)?;
        let ns = self.namespace().await;
        debug!(namespace = %ns, key, "prefs: clear");
        self.backend.remove(&ns, key).await
    }

    pub async fn contains(&self, key: &str) -> PrefsResult<bool> {
        if key.is_empty() {
            return Ok(false);
        }
        let ns = self.namespace().await;
        self.backend.contains(&ns, key).await
    }

    /// Returns every entry in the active namespace.
    pub async fn get_all(&self) -> PrefsResult<HashMap<String, String>> {
        let ns = self.namespace().await;
        self.backend.get_all(&ns).await
    }

    /// Removes every entry in the active namespace. Other namespaces are untouched.
    pub async fn clear_all(&self) -> PrefsResult<()> {
        let ns = self.namespace().await;
        debug!(namespace = %ns, "prefs: clear all");
        self.backend.clear_all(&ns).await
    }

    /// Applies each entry as if by [`Preferences::set`], in order.
    ///
    /// Entries with an empty key or an empty value are skipped. A failing
    /// write aborts the batch without undoing entries already written.
    pub async fn set_multiple<I, E>(&self, entries: I) -> PrefsResult<()>
    where
        I: IntoIterator<Item = E>,
        E: Into<Entry>,
    {
        let entries: Vec<Entry> = entries
            .into_iter()
            .map(Into::into)
            .filter(|entry| !entry.key.is_empty() && !entry.value.is_empty())
            .collect();
        if entries.is_empty() {
            return Ok(());
        }

        let ns = self.namespace().await;
        debug!(namespace = %ns, count = entries.len(), "prefs: set multiple");
        self.backend.set_many(&ns, &entries).await
    }

    /// Looks up every key. The result holds exactly one entry per distinct
    /// requested key, `None` where the key is absent.
    pub async fn get_multiple<I, K>(&self, keys: I) -> PrefsResult<HashMap<String, Option<String>>>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let ns = self.namespace().await;
        let mut values = HashMap::new();
        for key in keys {
            let key = key.as_ref();
            if values.contains_key(key) {
                continue;
            }
            let value = if key.is_empty() {
                None
            } else {
                self.backend.get(&ns, key).await?
            };
            values.insert(key.to_owned(), value);
        }
        Ok(values)
    }

    /// Removes each key as if by [`Preferences::clear`]. Empty keys are skipped.
    pub async fn clear_multiple<I, K>(&self, keys: I) -> PrefsResult<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .filter(|key| !key.as_ref().is_empty())
            .map(|key| key.as_ref().to_owned())
            .collect();
        if keys.is_empty() {
            return Ok(());
        }

        let ns = self.namespace().await;
        debug!(namespace = %ns, count = keys.len(), "prefs: clear multiple");
        self.backend.remove_many(&ns, &keys).await
    }
}

fn ensure_key(key: &str) -> PrefsResult<()> {
    if key.is_empty() {
        return Err(PrefsError::InvalidKey);
    }
    Ok(())
}
