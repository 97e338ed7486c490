use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use prefs_backend_memory::MemoryBackend;
use prefs_core::testutil::FaultyBackend;
use prefs_core::{Backend, Entry, Namespace, Preferences, PrefsError};

fn prefs() -> Preferences {
    Preferences::new(MemoryBackend::new())
}

#[tokio::test]
async fn set_then_get_and_contains() -> Result<()> {
    let prefs = prefs();
    prefs.set("theme", "dark").await?;

    assert_eq!(prefs.get("theme").await?.as_deref(), Some("dark"));
    assert!(prefs.contains("theme").await?);
    Ok(())
}

#[tokio::test]
async fn clear_removes_present_and_absent_keys() -> Result<()> {
    let prefs = prefs();
    prefs.set("token", "abc").await?;

    prefs.clear("token").await?;
    prefs.clear("never_set").await?;

    for key in ["token", "never_set"] {
        assert_eq!(prefs.get(key).await?, None);
        assert!(!prefs.contains(key).await?);
    }
    Ok(())
}

#[tokio::test]
async fn clear_all_twice_leaves_store_empty() -> Result<()> {
    let prefs = prefs();
    prefs.set_multiple([("a", "1"), ("b", "2")]).await?;

    prefs.clear_all().await?;
    assert!(prefs.get_all().await?.is_empty());
    prefs.clear_all().await?;
    assert!(prefs.get_all().await?.is_empty());
    assert!(!prefs.contains("a").await?);
    Ok(())
}

#[tokio::test]
async fn get_all_returns_active_namespace_only() -> Result<()> {
    let prefs = prefs();
    prefs.set("shared", "default").await?;
    prefs.select_namespace(Some("user_123")).await?;
    prefs.set("a", "1").await?;
    prefs.set("b", "2").await?;

    let expected: HashMap<String, String> = [("a", "1"), ("b", "2")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(prefs.get_all().await?, expected);
    Ok(())
}

#[tokio::test]
async fn namespaces_are_isolated() -> Result<()> {
    let prefs = prefs();
    prefs.select_namespace(Some("N1")).await?;
    prefs.set("a", "1").await?;

    prefs.select_namespace(Some("N2")).await?;
    assert_eq!(prefs.get("a").await?, None);

    prefs.select_namespace(Some("N1")).await?;
    assert_eq!(prefs.get("a").await?.as_deref(), Some("1"));
    Ok(())
}

#[tokio::test]
async fn empty_or_missing_namespace_selects_default() -> Result<()> {
    let prefs = prefs();
    prefs.set("k", "default").await?;

    prefs.select_namespace(Some("other")).await?;
    assert_eq!(prefs.namespace().await, Namespace::named("other"));

    prefs.select_namespace(Some("")).await?;
    assert_eq!(prefs.namespace().await, Namespace::Default);
    assert_eq!(prefs.get("k").await?.as_deref(), Some("default"));

    prefs.select_namespace(Some("other")).await?;
    prefs.select_namespace(None).await?;
    assert_eq!(prefs.get("k").await?.as_deref(), Some("default"));
    Ok(())
}

#[tokio::test]
async fn reselecting_active_namespace_skips_backend() -> Result<()> {
    let faulty = Arc::new(FaultyBackend::new(Arc::new(MemoryBackend::new())));
    let prefs = Preferences::from_arc(faulty.clone());
    prefs.select_namespace(Some("N1")).await?;

    // The backend would refuse to open anything now, so success proves it was not asked.
    faulty.fail_open(true);
    prefs.select_namespace(Some("N1")).await?;
    prefs
        .select_namespace(None)
        .await
        .expect_err("switching away should reach the failing backend");
    Ok(())
}

#[tokio::test]
async fn failed_select_keeps_previous_namespace() -> Result<()> {
    let faulty = Arc::new(FaultyBackend::new(Arc::new(MemoryBackend::new())));
    let prefs = Preferences::open(faulty.clone(), Some("N1")).await?;
    prefs.set("a", "1").await?;

    faulty.fail_open(true);
    let err = prefs.select_namespace(Some("N2")).await.unwrap_err();
    assert!(matches!(err, PrefsError::BackendUnavailable { .. }));
    assert_eq!(err.code(), "E_BACKEND_UNAVAILABLE");

    assert_eq!(prefs.namespace().await, Namespace::named("N1"));
    assert_eq!(prefs.get("a").await?.as_deref(), Some("1"));
    Ok(())
}

#[tokio::test]
async fn write_failures_are_reported() -> Result<()> {
    let faulty = Arc::new(FaultyBackend::new(Arc::new(MemoryBackend::new())));
    let prefs = Preferences::from_arc(faulty.clone());
    faulty.fail_writes(true);

    assert_eq!(prefs.set("k", "v").await.unwrap_err().code(), "E_BACKEND_FAILURE");
    assert_eq!(prefs.clear("k").await.unwrap_err().code(), "E_BACKEND_FAILURE");
    assert_eq!(prefs.clear_all().await.unwrap_err().code(), "E_BACKEND_FAILURE");
    assert!(prefs.set_multiple([("k", "v")]).await.is_err());
    assert!(prefs.clear_multiple(["k"]).await.is_err());
    Ok(())
}

#[tokio::test]
async fn read_failures_are_reported() -> Result<()> {
    let faulty = Arc::new(FaultyBackend::new(Arc::new(MemoryBackend::new())));
    let prefs = Preferences::from_arc(faulty.clone());
    faulty.fail_reads(true);

    assert!(prefs.get("k").await.is_err());
    assert!(prefs.contains("k").await.is_err());
    assert!(prefs.get_all().await.is_err());
    assert!(prefs.get_multiple(["k"]).await.is_err());
    Ok(())
}

#[tokio::test]
async fn empty_key_policy() -> Result<()> {
    let prefs = prefs();

    assert!(matches!(prefs.set("", "x").await, Err(PrefsError::InvalidKey)));
    assert!(matches!(prefs.clear("").await, Err(PrefsError::InvalidKey)));
    assert_eq!(prefs.get("").await?, None);
    assert!(!prefs.contains("").await?);
    assert!(prefs.get_all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_value_is_ignored_by_set() -> Result<()> {
    let prefs = prefs();
    prefs.set("blank", "").await?;
    assert!(!prefs.contains("blank").await?);

    prefs.set("kept", "v").await?;
    prefs.set("kept", "").await?;
    assert_eq!(prefs.get("kept").await?.as_deref(), Some("v"));
    Ok(())
}

#[tokio::test]
async fn get_multiple_reports_absent_keys() -> Result<()> {
    let prefs = prefs();
    prefs.set("x", "1").await?;

    let values = prefs.get_multiple(["x", "y"]).await?;
    let expected: HashMap<String, Option<String>> = [
        ("x".to_string(), Some("1".to_string())),
        ("y".to_string(), None),
    ]
    .into_iter()
    .collect();
    assert_eq!(values, expected);
    Ok(())
}

#[tokio::test]
async fn get_multiple_collapses_duplicates() -> Result<()> {
    let prefs = prefs();
    prefs.set("x", "1").await?;

    let values = prefs.get_multiple(["x", "x", "", "z"]).await?;
    assert_eq!(values.len(), 3);
    assert_eq!(values["x"].as_deref(), Some("1"));
    assert_eq!(values[""], None);
    assert_eq!(values["z"], None);
    Ok(())
}

#[tokio::test]
async fn set_multiple_skips_empty_keys_and_values() -> Result<()> {
    let prefs = prefs();
    prefs
        .set_multiple([
            Entry::new("", "x"),
            Entry::new("t", "ok"),
            Entry::new("blank", ""),
        ])
        .await?;

    assert_eq!(prefs.get("t").await?.as_deref(), Some("ok"));
    assert!(!prefs.contains("blank").await?);
    assert_eq!(prefs.get_all().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn set_multiple_last_entry_wins() -> Result<()> {
    let prefs = prefs();
    prefs
        .set_multiple([("k", "first"), ("other", "x"), ("k", "second")])
        .await?;

    assert_eq!(prefs.get("k").await?.as_deref(), Some("second"));
    Ok(())
}

#[tokio::test]
async fn single_entry_batches_match_single_key_calls() -> Result<()> {
    let batch = prefs();
    let single = prefs();
    for p in [&batch, &single] {
        p.set("pre", "existing").await?;
        p.set("gone", "soon").await?;
    }

    batch.set_multiple([("k", "v")]).await?;
    single.set("k", "v").await?;
    assert_eq!(batch.get_all().await?, single.get_all().await?);

    batch.set_multiple([("blank", "")]).await?;
    single.set("blank", "").await?;
    assert_eq!(batch.get_all().await?, single.get_all().await?);

    batch.set_multiple([("pre", "")]).await?;
    single.set("pre", "").await?;
    assert_eq!(batch.get_all().await?, single.get_all().await?);

    batch.clear_multiple(["gone"]).await?;
    single.clear("gone").await?;
    assert_eq!(batch.get_all().await?, single.get_all().await?);

    batch.clear_multiple(["missing"]).await?;
    single.clear("missing").await?;
    assert_eq!(batch.get_all().await?, single.get_all().await?);
    Ok(())
}

#[tokio::test]
async fn clear_multiple_skips_absent_and_empty_keys() -> Result<()> {
    let prefs = prefs();
    prefs.set_multiple([("a", "1"), ("b", "2"), ("c", "3")]).await?;

    prefs.clear_multiple(["a", "", "nope", "c"]).await?;

    assert_eq!(prefs.get_all().await?.into_keys().collect::<Vec<_>>(), ["b"]);
    Ok(())
}

#[tokio::test]
async fn facades_share_a_backend_but_not_a_namespace() -> Result<()> {
    let backend: Arc<dyn Backend> = Arc::new(MemoryBackend::new());
    let first = Preferences::open(backend.clone(), Some("user_1")).await?;
    let second = Preferences::from_arc(backend);

    first.set("k", "scoped").await?;
    assert_eq!(second.get("k").await?, None);

    second.select_namespace(Some("user_1")).await?;
    assert_eq!(second.get("k").await?.as_deref(), Some("scoped"));
    assert_eq!(first.namespace().await, second.namespace().await);
    Ok(())
}
