//! Lazily-constructed singleton registry
//!
//! Each named service is built at most once, on first request, from a
//! compiled build spec and a typed factory table. Constructor arguments
//! may be literals, nested buildable nodes, or placeholder expressions;
//! they are resolved right before the factory runs. The registry is a
//! plain injectable value - owning one per runtime context keeps
//! lifecycle explicit, especially in tests.

use crate::config::{env_or, env_value, ConfigLoader};
use crate::graph::expr::Expr;
use conflux_domain::error::{Error, Result};
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Reserved key marking a configuration node as buildable
pub const CONSTRUCTOR_KEY: &str = "()";

/// Type-erased service payload
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

type ServiceFactory = Arc<dyn Fn(&ResolvedArgs) -> Result<BuiltService> + Send + Sync>;

/// A constructed service: the instance plus its exported attributes
///
/// Attributes are what `get(name, attr)` placeholders read. The
/// registry exports every literal resolved constructor argument as an
/// attribute by default; factories may add or override their own.
pub struct BuiltService {
    instance: ServiceInstance,
    attrs: Map<String, Value>,
}

impl BuiltService {
    /// Wrap a concrete value as a service instance
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            instance: Arc::new(value),
            attrs: Map::new(),
        }
    }

    /// Export an attribute, overriding any default export
    pub fn with_attr<S: Into<String>>(mut self, name: S, value: Value) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    /// Read an exported attribute
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// The type-erased instance payload
    pub fn instance(&self) -> &ServiceInstance {
        &self.instance
    }

    /// Downcast the payload to its registered type
    pub fn instance_as<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.instance.downcast_ref::<T>().cloned()
    }

    fn set_attr_if_absent(&mut self, name: String, value: Value) {
        self.attrs.entry(name).or_insert(value);
    }
}

impl std::fmt::Debug for BuiltService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltService")
            .field("attrs", &self.attrs)
            .finish()
    }
}

/// A resolved constructor argument
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// A plain configuration value
    Value(Value),
    /// Another built service
    Service(Arc<BuiltService>),
}

/// Resolved constructor arguments handed to a factory
///
/// Factories read their own typed parameters out of this map and apply
/// their own defaults for anything missing.
#[derive(Debug, Clone, Default)]
pub struct ResolvedArgs {
    entries: BTreeMap<String, ArgValue>,
}

impl ResolvedArgs {
    /// Look up a plain value argument
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.entries.get(name) {
            Some(ArgValue::Value(v)) => Some(v),
            _ => None,
        }
    }

    /// Look up a service argument
    pub fn service(&self, name: &str) -> Option<Arc<BuiltService>> {
        match self.entries.get(name) {
            Some(ArgValue::Service(s)) => Some(Arc::clone(s)),
            _ => None,
        }
    }

    /// A required plain value argument
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.value(name)
            .ok_or_else(|| Error::config(format!("missing required argument '{name}'")))
    }

    /// String argument with a default
    pub fn str_or(&self, name: &str, default: &str) -> String {
        self.value(name)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    /// Integer argument with a default
    pub fn u64_or(&self, name: &str, default: u64) -> u64 {
        self.value(name).and_then(Value::as_u64).unwrap_or(default)
    }

    /// Boolean argument with a default
    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.value(name).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Duration argument given in whole seconds
    pub fn duration_secs(&self, name: &str) -> Option<Duration> {
        self.value(name).and_then(Value::as_u64).map(Duration::from_secs)
    }

    /// Export the literal arguments as a default attribute map
    fn literal_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (name, arg) in &self.entries {
            if let ArgValue::Value(v) = arg {
                map.insert(name.clone(), v.clone());
            }
        }
        map
    }
}

/// Compiled form of a buildable configuration node
#[derive(Debug, Clone)]
struct BuildSpec {
    target: String,
    args: BTreeMap<String, ArgSpec>,
}

#[derive(Debug, Clone)]
enum ArgSpec {
    Literal(Value),
    Placeholder(Expr),
    Build(BuildSpec),
}

fn compile_node(map: &Map<String, Value>) -> Result<BuildSpec> {
    let target = map
        .get(CONSTRUCTOR_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::config(format!("buildable node needs a string '{CONSTRUCTOR_KEY}' key"))
        })?
        .to_string();

    let mut args = BTreeMap::new();
    for (name, value) in map {
        if name == CONSTRUCTOR_KEY {
            continue;
        }
        args.insert(name.clone(), compile_arg(value)?);
    }
    Ok(BuildSpec { target, args })
}

fn compile_arg(value: &Value) -> Result<ArgSpec> {
    match value {
        Value::Object(map) if map.contains_key(CONSTRUCTOR_KEY) => {
            Ok(ArgSpec::Build(compile_node(map)?))
        }
        Value::String(s) => Ok(match Expr::parse(s) {
            Some(expr) => ArgSpec::Placeholder(expr),
            None => ArgSpec::Literal(value.clone()),
        }),
        other => Ok(ArgSpec::Literal(other.clone())),
    }
}

/// Declarative singleton registry
pub struct ServiceGraph {
    raw: DashMap<String, Value>,
    specs: DashMap<String, BuildSpec>,
    factories: DashMap<String, ServiceFactory>,
    built: DashMap<String, Arc<BuiltService>>,
    loader: Option<ConfigLoader>,
}

impl ServiceGraph {
    /// Create an empty graph with no configuration source
    pub fn new() -> Self {
        Self {
            raw: DashMap::new(),
            specs: DashMap::new(),
            factories: DashMap::new(),
            built: DashMap::new(),
            loader: None,
        }
    }

    /// Create a graph backed by a configuration loader and load it
    pub fn with_loader(loader: ConfigLoader) -> Result<Self> {
        let mut graph = Self::new();
        graph.loader = Some(loader);
        graph.refresh()?;
        Ok(graph)
    }

    /// Re-scan the configuration source and merge it in
    ///
    /// Already-built singletons are never invalidated; only the raw
    /// table and compiled specs are updated.
    pub fn refresh(&self) -> Result<()> {
        let Some(loader) = &self.loader else {
            return Ok(());
        };
        let documents = loader.load()?;
        self.merge_documents(documents)
    }

    /// Merge configuration documents into the raw table
    pub fn merge_documents(&self, documents: Map<String, Value>) -> Result<()> {
        for (name, value) in documents {
            if let Value::Object(map) = &value {
                if map.contains_key(CONSTRUCTOR_KEY) {
                    self.specs.insert(name.clone(), compile_node(map)?);
                }
            }
            self.raw.insert(name, value);
        }
        Ok(())
    }

    /// Register a factory for a target type name
    pub fn register_factory<S, F>(&self, target: S, factory: F)
    where
        S: Into<String>,
        F: Fn(&ResolvedArgs) -> Result<BuiltService> + Send + Sync + 'static,
    {
        self.factories.insert(target.into(), Arc::new(factory));
    }

    /// Raw configuration value registered under `name`
    pub fn config(&self, name: &str) -> Option<Value> {
        self.raw.get(name).map(|v| v.value().clone())
    }

    /// Raw configuration value with a default
    pub fn config_or(&self, name: &str, default: Value) -> Value {
        self.config(name).unwrap_or(default)
    }

    /// The singleton for `name`, built on first access
    pub fn get(&self, name: &str) -> Result<Arc<BuiltService>> {
        self.get_with_stack(name, &mut Vec::new())
    }

    /// The singleton for `name`, downcast to its registered type
    pub fn get_as<T: Clone + Send + Sync + 'static>(&self, name: &str) -> Result<T> {
        let service = self.get(name)?;
        service
            .instance_as::<T>()
            .ok_or_else(|| Error::config(format!("service '{name}' has an unexpected type")))
    }

    /// Register and build a service from an explicit node
    ///
    /// Fails with [`Error::ServiceExists`] when `name` already resolved
    /// to an instance.
    pub fn register(&self, name: &str, node: &Value) -> Result<Arc<BuiltService>> {
        if self.built.contains_key(name) {
            return Err(Error::service_exists(name));
        }
        let map = node
            .as_object()
            .ok_or_else(|| Error::config(format!("service '{name}' node must be a mapping")))?;
        self.specs.insert(name.to_string(), compile_node(map)?);
        self.raw.insert(name.to_string(), node.clone());
        self.get(name)
    }

    /// Register an already-built service under `name`
    pub fn register_instance(&self, name: &str, service: BuiltService) -> Result<Arc<BuiltService>> {
        if self.built.contains_key(name) {
            return Err(Error::service_exists(name));
        }
        let arc = Arc::new(service);
        let out = Arc::clone(
            self.built
                .entry(name.to_string())
                .or_insert_with(|| Arc::clone(&arc))
                .value(),
        );
        Ok(out)
    }

    fn get_with_stack(&self, name: &str, stack: &mut Vec<String>) -> Result<Arc<BuiltService>> {
        if let Some(built) = self.built.get(name) {
            return Ok(Arc::clone(built.value()));
        }
        if stack.iter().any(|n| n == name) {
            return Err(Error::circular_dependency(name));
        }

        let spec = self
            .specs
            .get(name)
            .map(|s| s.value().clone())
            .ok_or_else(|| Error::not_found(format!("service '{name}'")))?;

        stack.push(name.to_string());
        let built = self.build_spec(&spec, stack);
        stack.pop();
        let built = built?;

        tracing::debug!(service = name, target = %spec.target, "service built");

        // First insert wins if two tasks raced on the same name; both
        // end up returning the one registered singleton.
        let arc = Arc::new(built);
        let out = Arc::clone(
            self.built
                .entry(name.to_string())
                .or_insert_with(|| Arc::clone(&arc))
                .value(),
        );
        Ok(out)
    }

    fn build_spec(&self, spec: &BuildSpec, stack: &mut Vec<String>) -> Result<BuiltService> {
        let factory = self
            .factories
            .get(&spec.target)
            .map(|f| Arc::clone(f.value()))
            .ok_or_else(|| {
                Error::config(format!("no factory registered for type '{}'", spec.target))
            })?;

        let mut entries = BTreeMap::new();
        for (arg_name, arg_spec) in &spec.args {
            entries.insert(arg_name.clone(), self.resolve_arg(arg_spec, stack)?);
        }
        let args = ResolvedArgs { entries };

        let mut built = factory(&args)?;
        for (name, value) in args.literal_map() {
            built.set_attr_if_absent(name, value);
        }
        Ok(built)
    }

    fn resolve_arg(&self, spec: &ArgSpec, stack: &mut Vec<String>) -> Result<ArgValue> {
        match spec {
            ArgSpec::Literal(value) => Ok(ArgValue::Value(value.clone())),
            ArgSpec::Build(build) => {
                // Anonymous nested service: scoped to its parent, not
                // registered under a name of its own.
                Ok(ArgValue::Service(Arc::new(self.build_spec(build, stack)?)))
            }
            ArgSpec::Placeholder(expr) => self.resolve_expr(expr, stack),
        }
    }

    fn resolve_expr(&self, expr: &Expr, stack: &mut Vec<String>) -> Result<ArgValue> {
        match expr {
            Expr::Config { name, path } => {
                let mut value = self.config(name).ok_or_else(|| {
                    Error::config(format!("placeholder references unknown config '{name}'"))
                })?;
                for key in path {
                    value = value
                        .get(key)
                        .cloned()
                        .ok_or_else(|| {
                            Error::config(format!("config '{name}' has no key '{key}'"))
                        })?;
                }
                Ok(ArgValue::Value(value))
            }
            Expr::Get { name, attrs } => {
                let service = self.get_with_stack(name, stack)?;
                if attrs.is_empty() {
                    return Ok(ArgValue::Service(service));
                }
                let mut iter = attrs.iter();
                let first = iter.next().filter(|s| !s.is_empty()).ok_or_else(|| {
                    Error::config(format!("empty attribute chain on service '{name}'"))
                })?;
                let mut value = service
                    .attr(first)
                    .cloned()
                    .ok_or_else(|| {
                        Error::config(format!("service '{name}' has no attribute '{first}'"))
                    })?;
                for key in iter {
                    value = value.get(key).cloned().ok_or_else(|| {
                        Error::config(format!("service '{name}' attribute path missing '{key}'"))
                    })?;
                }
                Ok(ArgValue::Value(value))
            }
            Expr::Env { name, default } => {
                let value = match default {
                    Some(default) => env_or(name, default),
                    None => env_value(name).ok_or_else(|| {
                        Error::config(format!(
                            "placeholder references unset environment variable '{name}'"
                        ))
                    })?,
                };
                Ok(ArgValue::Value(value))
            }
        }
    }
}

impl Default for ServiceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceGraph")
            .field("configs", &self.raw.len())
            .field("built", &self.built.len())
            .finish()
    }
}
