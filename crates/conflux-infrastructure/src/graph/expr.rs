//! Placeholder expressions
//!
//! Strings of the form `kind(arg[, sub...])` inside service
//! configuration are compiled once, at load time, into this tagged
//! tree. Resolution is single-pass: a resolved value is never
//! re-scanned for further placeholders.

/// A compiled placeholder expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `config(name[, path...])` - a raw configuration value, optionally
    /// walking nested keys
    Config {
        /// Top-level configuration name
        name: String,
        /// Nested keys to walk
        path: Vec<String>,
    },
    /// `get(name[, attr...])` - another service, optionally reading an
    /// attribute chain off it
    Get {
        /// Service name to resolve (built on demand)
        name: String,
        /// Attribute chain to read
        attrs: Vec<String>,
    },
    /// `env(name[, default])` - a process environment variable
    Env {
        /// Variable name
        name: String,
        /// Fallback when the variable is unset
        default: Option<String>,
    },
}

impl Expr {
    /// Parse a placeholder expression, returning `None` for plain strings
    ///
    /// Only whole-string expressions count; a string that merely
    /// contains `config(...)` somewhere inside is a literal.
    pub fn parse(raw: &str) -> Option<Expr> {
        let raw = raw.trim();
        let (kind, rest) = raw.split_once('(')?;
        let inner = rest.strip_suffix(')')?;
        if inner.contains('(') {
            return None;
        }

        let mut items = inner.split(',').map(str::trim);
        let name = items.next().filter(|s| !s.is_empty())?.to_string();
        let tail: Vec<String> = items
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        match kind.trim() {
            "config" => Some(Expr::Config { name, path: tail }),
            "get" => Some(Expr::Get { name, attrs: tail }),
            "env" => Some(Expr::Env {
                name,
                default: tail.into_iter().next(),
            }),
            _ => None,
        }
    }
}
