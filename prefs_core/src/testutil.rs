//! Test utilities for `Backend` implementations.
//!
//! This module provides a test suite that can be run against any `Backend`
//! implementation to verify that it honors the contract the
//! [`Preferences`](crate::Preferences) facade relies on, plus a
//! fault-injecting wrapper for exercising error paths.
//!
//! # Usage
//!
//! In your backend crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! prefs_core = { workspace = true, features = ["testutil"] }
//! ```
//!
//! In your test file:
//!
//! ```ignore
//! use prefs_core::testutil::BackendTests;
//!
//! #[tokio::test]
//! async fn test_my_backend() {
//!     let backend = MyBackend::new(...);
//!     BackendTests::new(&backend).run_all().await.unwrap();
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rand::Rng;

use crate::{Backend, BackendFeatures, Entry, Namespace, PrefsError, PrefsResult};

/// Test suite for `Backend` implementations.
///
/// Every test works in namespaces derived from a random prefix, so the
/// suite can run against a backend that already holds data. The one
/// exception is `test_default_namespace`, which also clears the namespace
/// named `"default"`.
pub struct BackendTests<'a, B> {
    backend: &'a B,
    prefix: String,
}

impl<'a, B: Backend> BackendTests<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        let prefix = format!("test_{}", rand::rng().random::<u32>());
        Self { backend, prefix }
    }

    pub fn with_prefix(backend: &'a B, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    fn ns(&self, name: &str) -> Namespace {
        Namespace::named(format!("{}_{}", self.prefix, name))
    }

    /// Run all tests.
    pub async fn run_all(&self) -> PrefsResult<()> {
        self.test_set_get().await?;
        self.test_missing_key().await?;
        self.test_overwrite().await?;
        self.test_remove().await?;
        self.test_get_all().await?;
        self.test_clear_all().await?;
        self.test_namespace_isolation().await?;
        self.test_default_namespace().await?;
        self.test_batches().await?;

        self.cleanup().await
    }

    pub async fn test_set_get(&self) -> PrefsResult<()> {
        let ns = self.ns("set_get");
        self.backend.open_namespace(&ns).await?;
        self.backend.set(&ns, "theme", "dark").await?;

        assert_eq!(
            self.backend.get(&ns, "theme").await?.as_deref(),
            Some("dark"),
            "stored value should be returned"
        );
        assert!(
            self.backend.contains(&ns, "theme").await?,
            "contains should see a stored key"
        );
        Ok(())
    }

    pub async fn test_missing_key(&self) -> PrefsResult<()> {
        let ns = self.ns("missing");
        self.backend.open_namespace(&ns).await?;

        assert_eq!(self.backend.get(&ns, "nope").await?, None);
        assert!(!self.backend.contains(&ns, "nope").await?);
        self.backend.remove(&ns, "nope").await?;
        Ok(())
    }

    pub async fn test_overwrite(&self) -> PrefsResult<()> {
        let ns = self.ns("overwrite");
        self.backend.open_namespace(&ns).await?;
        self.backend.set(&ns, "lang", "en").await?;
        self.backend.set(&ns, "lang", "de").await?;

        assert_eq!(
            self.backend.get(&ns, "lang").await?.as_deref(),
            Some("de"),
            "overwritten value should be new"
        );
        Ok(())
    }

    pub async fn test_remove(&self) -> PrefsResult<()> {
        let ns = self.ns("remove");
        self.backend.open_namespace(&ns).await?;
        self.backend.set(&ns, "token", "abc").await?;
        self.backend.remove(&ns, "token").await?;

        assert_eq!(self.backend.get(&ns, "token").await?, None);
        assert!(
            !self.backend.contains(&ns, "token").await?,
            "removed key should be gone"
        );
        Ok(())
    }

    pub async fn test_get_all(&self) -> PrefsResult<()> {
        let ns = self.ns("get_all");
        self.backend.open_namespace(&ns).await?;
        self.backend.set(&ns, "a", "1").await?;
        self.backend.set(&ns, "b", "2").await?;
        self.backend.set(&ns, "empty", "").await?;

        let expected: HashMap<String, String> = [("a", "1"), ("b", "2"), ("empty", "")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(self.backend.get_all(&ns).await?, expected);
        Ok(())
    }

    pub async fn test_clear_all(&self) -> PrefsResult<()> {
        let ns = self.ns("clear_all");
        self.backend.open_namespace(&ns).await?;
        self.backend.set(&ns, "a", "1").await?;
        self.backend.set(&ns, "b", "2").await?;

        self.backend.clear_all(&ns).await?;
        assert!(self.backend.get_all(&ns).await?.is_empty());
        assert!(!self.backend.contains(&ns, "a").await?);

        self.backend.clear_all(&ns).await?;
        assert!(
            self.backend.get_all(&ns).await?.is_empty(),
            "second clear_all should leave the namespace empty"
        );
        Ok(())
    }

    pub async fn test_namespace_isolation(&self) -> PrefsResult<()> {
        let first = self.ns("iso_one");
        let second = self.ns("iso_two");
        self.backend.open_namespace(&first).await?;
        self.backend.open_namespace(&second).await?;

        self.backend.set(&first, "a", "1").await?;
        assert_eq!(self.backend.get(&second, "a").await?, None);

        self.backend.set(&second, "b", "2").await?;
        self.backend.clear_all(&second).await?;
        assert_eq!(
            self.backend.get(&first, "a").await?.as_deref(),
            Some("1"),
            "clear_all must not reach other namespaces"
        );
        Ok(())
    }

    pub async fn test_default_namespace(&self) -> PrefsResult<()> {
        let key = format!("{}_default_key", self.prefix);
        let ns = Namespace::Default;
        self.backend.open_namespace(&ns).await?;
        self.backend.set(&ns, &key, "v").await?;
        assert_eq!(self.backend.get(&ns, &key).await?.as_deref(), Some("v"));
        assert_eq!(self.backend.get(&self.ns("iso_one"), &key).await?, None);

        // a namespace literally named like the default partition stays separate
        let named = Namespace::named("default");
        self.backend.open_namespace(&named).await?;
        assert_eq!(self.backend.get(&named, &key).await?, None);
        self.backend.set(&named, &key, "named").await?;
        self.backend.clear_all(&named).await?;
        assert_eq!(
            self.backend.get(&ns, &key).await?.as_deref(),
            Some("v"),
            "clearing the namespace named \"default\" must not touch the default one"
        );

        self.backend.remove(&ns, &key).await?;
        assert!(!self.backend.contains(&ns, &key).await?);
        Ok(())
    }

    pub async fn test_batches(&self) -> PrefsResult<()> {
        let ns = self.ns("batches");
        self.backend.open_namespace(&ns).await?;
        let entries = vec![
            Entry::new("x", "1"),
            Entry::new("y", "2"),
            Entry::new("x", "3"),
        ];
        self.backend.set_many(&ns, &entries).await?;
        assert_eq!(
            self.backend.get(&ns, "x").await?.as_deref(),
            Some("3"),
            "later entries in a batch should win"
        );
        assert_eq!(self.backend.get(&ns, "y").await?.as_deref(), Some("2"));

        let keys = vec!["x".to_string(), "missing".to_string()];
        self.backend.remove_many(&ns, &keys).await?;
        assert!(!self.backend.contains(&ns, "x").await?);
        assert!(self.backend.contains(&ns, "y").await?);
        Ok(())
    }

    /// Empties every namespace the suite wrote to.
    pub async fn cleanup(&self) -> PrefsResult<()> {
        for name in [
            "set_get",
            "missing",
            "overwrite",
            "remove",
            "get_all",
            "clear_all",
            "iso_one",
            "iso_two",
            "batches",
        ] {
            let _ = self.backend.clear_all(&self.ns(name)).await;
        }
        Ok(())
    }
}

/// Wraps a backend and fails selected operations on demand.
#[derive(Debug)]
pub struct FaultyBackend {
    inner: Arc<dyn Backend>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    fail_open: AtomicBool,
}

impl FaultyBackend {
    pub fn new(inner: Arc<dyn Backend>) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> PrefsResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PrefsError::backend(std::io::Error::other(
                "injected write failure",
            )));
        }
        Ok(())
    }

    fn check_read(&self) -> PrefsResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PrefsError::backend(std::io::Error::other(
                "injected read failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FaultyBackend {
    fn features(&self) -> BackendFeatures {
        self.inner.features()
    }

    async fn open_namespace(&self, ns: &Namespace) -> PrefsResult<()> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(PrefsError::unavailable(ns, "injected open failure"));
        }
        self.inner.open_namespace(ns).await
    }

    async fn get(&self, ns: &Namespace, key: &str) -> PrefsResult<Option<String>> {
        self.check_read()?;
        self.inner.get(ns, key).await
    }

    async fn set(&self, ns: &Namespace, key: &str, value: &str) -> PrefsResult<()> {
        self.check_write()?;
        self.inner.set(ns, key, value).await
    }

    async fn remove(&self, ns: &Namespace, key: &str) -> PrefsResult<()> {
        self.check_write()?;
        self.inner.remove(ns, key).await
    }

    async fn contains(&self, ns: &Namespace, key: &str) -> PrefsResult<bool> {
        self.check_read()?;
        self.inner.contains(ns, key).await
    }

    async fn get_all(&self, ns: &Namespace) -> PrefsResult<HashMap<String, String>> {
        self.check_read()?;
        self.inner.get_all(ns).await
    }

    async fn clear_all(&self, ns: &Namespace) -> PrefsResult<()> {
        self.check_write()?;
        self.inner.clear_all(ns).await
    }
}
