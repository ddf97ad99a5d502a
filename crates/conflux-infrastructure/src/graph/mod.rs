//! Service graph
//!
//! Declarative singleton registry: named configuration nodes describe
//! how to build shared components through a typed factory table, with a
//! small placeholder language (`config(...)`, `get(...)`, `env(...)`)
//! for cross-referencing configuration values, other services and
//! environment variables.

mod expr;
mod factories;
mod registry;

pub use expr::Expr;
pub use factories::register_builtin_factories;
pub use registry::{
    ArgValue, BuiltService, ResolvedArgs, ServiceGraph, ServiceInstance, CONSTRUCTOR_KEY,
};
