//! Tests for the configuration loader

use conflux_domain::error::Error;
use conflux_infrastructure::config::ConfigLoader;
use conflux_infrastructure::graph::{register_builtin_factories, ServiceGraph};
use serde_json::json;
use std::fs;

/// Helper to set env var safely
fn set_env(key: &str, value: &str) {
    // SAFETY: env-mutating tests run with --test-threads=1
    unsafe {
        std::env::set_var(key, value);
    }
}

#[test]
fn test_loads_and_merges_toml_files_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.toml"),
        "[limits]\nentries = 5\nlabel = \"first\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("z.toml"), "[limits]\nentries = 9\n").unwrap();

    let documents = ConfigLoader::new(dir.path()).load().unwrap();
    let limits = documents.get("limits").unwrap();

    // z.toml merges after a.toml and wins on the shared key
    assert_eq!(limits.get("entries"), Some(&json!(9)));
    assert_eq!(limits.get("label"), Some(&json!("first")));
}

#[test]
fn test_scans_subdirectories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("services")).unwrap();
    fs::write(
        dir.path().join("services").join("cache.toml"),
        "[\"cache.default\"]\n\"()\" = \"memory_cache\"\nmax_entries = 32\n",
    )
    .unwrap();

    let documents = ConfigLoader::new(dir.path()).load().unwrap();
    let node = documents.get("cache.default").unwrap();
    assert_eq!(node.get("()"), Some(&json!("memory_cache")));
    assert_eq!(node.get("max_entries"), Some(&json!(32)));
}

#[test]
#[ignore = "requires --test-threads=1 due to env var mutations"]
fn test_environment_overrides_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.toml"), "[limits]\nentries = 5\n").unwrap();
    set_env("LOADERTEST_LIMITS__ENTRIES", "11");

    let documents = ConfigLoader::new(dir.path())
        .with_env_prefix("LOADERTEST")
        .load()
        .unwrap();

    let limits = documents.get("limits").unwrap();
    assert_eq!(limits.get("entries"), Some(&json!(11)));
}

#[test]
fn test_missing_directory_is_not_found() {
    let err = ConfigLoader::new("/definitely/not/here").load().unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_refresh_picks_up_new_documents() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.toml"), "[limits]\nentries = 5\n").unwrap();

    let graph = ServiceGraph::with_loader(ConfigLoader::new(dir.path())).unwrap();
    assert_eq!(graph.config("limits"), Some(json!({ "entries": 5 })));

    fs::write(dir.path().join("b.toml"), "[extra]\nflag = true\n").unwrap();
    graph.refresh().unwrap();
    assert_eq!(graph.config("extra"), Some(json!({ "flag": true })));
}

#[test]
fn test_graph_builds_services_from_loaded_documents() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("cache.toml"),
        concat!(
            "[limits]\nentries = 16\n\n",
            "[\"cache.default\"]\n",
            "\"()\" = \"memory_cache\"\n",
            "max_entries = \"config(limits, entries)\"\n",
        ),
    )
    .unwrap();

    let graph = ServiceGraph::new();
    register_builtin_factories(&graph);
    let documents = ConfigLoader::new(dir.path()).load().unwrap();
    graph.merge_documents(documents).unwrap();

    let service = graph.get("cache.default").unwrap();
    assert_eq!(service.attr("max_entries"), Some(&json!(16)));
}
