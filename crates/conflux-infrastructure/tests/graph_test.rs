//! Tests for the service graph

use conflux_domain::error::Error;
use conflux_domain::ports::cache::CacheBackend;
use conflux_infrastructure::graph::{
    register_builtin_factories, BuiltService, ServiceGraph,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn doc(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn graph_with(value: Value) -> ServiceGraph {
    let graph = ServiceGraph::new();
    register_builtin_factories(&graph);
    graph.merge_documents(doc(value)).unwrap();
    graph
}

#[test]
fn test_get_returns_the_same_singleton() {
    let graph = graph_with(json!({
        "cache.default": { "()": "memory_cache", "max_entries": 100 }
    }));

    let first = graph.get("cache.default").unwrap();
    let second = graph.get("cache.default").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_get_as_downcasts_to_registered_type() {
    let graph = graph_with(json!({
        "cache.default": { "()": "memory_cache" }
    }));

    let backend: Arc<dyn CacheBackend> = graph.get_as("cache.default").unwrap();
    assert_eq!(backend.backend_name(), "memory");
}

#[test]
fn test_unknown_service_is_not_found() {
    let graph = ServiceGraph::new();
    let err = graph.get("nowhere").unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_register_instance_rejects_duplicates() {
    let graph = ServiceGraph::new();
    graph
        .register_instance("svc", BuiltService::new(1u64))
        .unwrap();

    let err = graph
        .register_instance("svc", BuiltService::new(2u64))
        .unwrap_err();
    assert!(matches!(err, Error::ServiceExists { .. }));
}

#[test]
fn test_register_rejects_already_built_name() {
    let graph = graph_with(json!({
        "cache.default": { "()": "memory_cache" }
    }));
    graph.get("cache.default").unwrap();

    let err = graph
        .register("cache.default", &json!({ "()": "null_cache" }))
        .unwrap_err();
    assert!(matches!(err, Error::ServiceExists { .. }));
}

#[test]
fn test_config_placeholder_resolves_nested_path() {
    let graph = graph_with(json!({
        "limits": { "entries": 5 },
        "cache.default": {
            "()": "memory_cache",
            "max_entries": "config(limits, entries)"
        }
    }));

    let service = graph.get("cache.default").unwrap();
    assert_eq!(service.attr("max_entries"), Some(&json!(5)));
}

#[test]
fn test_get_placeholder_reads_exported_attrs() {
    let graph = ServiceGraph::new();
    graph.register_factory("settings", |args| {
        Ok(BuiltService::new(args.u64_or("port", 0)))
    });
    graph.register_factory("client", |args| {
        let port = args.require("port")?.as_u64().unwrap_or(0);
        Ok(BuiltService::new(port + 1))
    });
    graph
        .merge_documents(doc(json!({
            "settings": { "()": "settings", "port": 7 },
            "client": { "()": "client", "port": "get(settings, port)" }
        })))
        .unwrap();

    let client = graph.get("client").unwrap();
    assert_eq!(client.instance_as::<u64>(), Some(8));
    // literal args are exported as attrs, resolved placeholders included
    assert_eq!(client.attr("port"), Some(&json!(7)));
}

#[test]
fn test_env_placeholder_uses_default_when_unset() {
    let graph = ServiceGraph::new();
    graph.register_factory("settings", |args| {
        Ok(BuiltService::new(args.bool_or("debug", true)))
    });
    graph
        .merge_documents(doc(json!({
            "settings": { "()": "settings", "debug": "env(GRAPH_TEST_UNSET_VAR, false)" }
        })))
        .unwrap();

    let settings = graph.get("settings").unwrap();
    assert_eq!(settings.instance_as::<bool>(), Some(false));
}

#[test]
#[ignore = "requires --test-threads=1 due to env var mutations"]
fn test_env_placeholder_reads_variable() {
    // SAFETY: env-mutating tests run with --test-threads=1
    unsafe {
        std::env::set_var("GRAPH_TEST_PORT", "9090");
    }
    let graph = ServiceGraph::new();
    graph.register_factory("settings", |args| {
        Ok(BuiltService::new(args.u64_or("port", 0)))
    });
    graph
        .merge_documents(doc(json!({
            "settings": { "()": "settings", "port": "env(GRAPH_TEST_PORT)" }
        })))
        .unwrap();

    let settings = graph.get("settings").unwrap();
    assert_eq!(settings.instance_as::<u64>(), Some(9090));
}

#[test]
fn test_nested_buildable_node_is_scoped_to_parent() {
    let graph = ServiceGraph::new();
    register_builtin_factories(&graph);
    graph.register_factory("wrapper", |args| {
        let inner = args.service("inner").ok_or_else(|| {
            conflux_domain::error::Error::config("wrapper needs an 'inner' service")
        })?;
        let backend = inner
            .instance_as::<Arc<dyn CacheBackend>>()
            .ok_or_else(|| conflux_domain::error::Error::config("inner must be a cache"))?;
        Ok(BuiltService::new(backend.backend_name().to_string()))
    });
    graph
        .merge_documents(doc(json!({
            "wrapper": {
                "()": "wrapper",
                "inner": { "()": "null_cache" }
            }
        })))
        .unwrap();

    let wrapper = graph.get("wrapper").unwrap();
    assert_eq!(wrapper.instance_as::<String>(), Some("null".to_string()));
}

#[test]
fn test_dependency_cycle_is_an_error() {
    let graph = ServiceGraph::new();
    graph.register_factory("node", |_args| Ok(BuiltService::new(())));
    graph
        .merge_documents(doc(json!({
            "a": { "()": "node", "dep": "get(b)" },
            "b": { "()": "node", "dep": "get(a)" }
        })))
        .unwrap();

    let err = graph.get("a").unwrap_err();
    assert!(matches!(err, Error::CircularDependency { .. }));
}

#[test]
fn test_missing_factory_is_a_config_error() {
    let graph = graph_with(json!({
        "svc": { "()": "no_such_type" }
    }));
    let err = graph.get("svc").unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_merge_preserves_built_singletons() {
    let graph = graph_with(json!({
        "cache.default": { "()": "memory_cache", "max_entries": 10 }
    }));
    let before = graph.get("cache.default").unwrap();

    graph
        .merge_documents(doc(json!({
            "cache.default": { "()": "memory_cache", "max_entries": 999 }
        })))
        .unwrap();

    let after = graph.get("cache.default").unwrap();
    assert!(Arc::ptr_eq(&before, &after));
}

#[test]
fn test_config_lookup_with_default() {
    let graph = graph_with(json!({ "limits": { "entries": 5 } }));
    assert_eq!(graph.config("limits"), Some(json!({ "entries": 5 })));
    assert_eq!(graph.config_or("missing", json!(1)), json!(1));
}
