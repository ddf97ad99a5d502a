//! Configuration loading
//!
//! Handles loading service graph documents from TOML files and
//! environment variables, merged through Figment.

mod loader;

pub use loader::ConfigLoader;

use serde_json::Value;

/// Read an environment variable as a configuration value
///
/// Returns `None` when the variable is unset or not valid unicode.
pub fn env_value(name: &str) -> Option<Value> {
    std::env::var(name).ok().map(|raw| coerce_env(&raw))
}

/// Read an environment variable, coercing `default` when it is unset
pub fn env_or(name: &str, default: &str) -> Value {
    env_value(name).unwrap_or_else(|| coerce_env(default))
}

/// Coerce a raw environment string into a typed value
///
/// Booleans and integers are recognized; everything else stays a
/// string.
pub fn coerce_env(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => match raw.parse::<i64>() {
            Ok(n) => Value::Number(n.into()),
            Err(_) => Value::String(raw.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_booleans_and_integers() {
        assert_eq!(coerce_env("true"), json!(true));
        assert_eq!(coerce_env("false"), json!(false));
        assert_eq!(coerce_env("42"), json!(42));
        assert_eq!(coerce_env("-7"), json!(-7));
        assert_eq!(coerce_env("localhost"), json!("localhost"));
        assert_eq!(coerce_env("4.5"), json!("4.5"));
    }
}
