//! Error handling types

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Conflux runtime
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// A bounded wait exceeded its deadline
    #[error("Timed out waiting for {operation}")]
    Timeout {
        /// The operation that was waiting
        operation: String,
    },

    /// Cache backend operation error
    ///
    /// Always caught and logged at the cache layer boundary; never
    /// propagated into application code.
    #[error("Cache error: {message}")]
    Cache {
        /// Description of the cache error
        message: String,
    },

    /// Failure observed through a coalescing window
    ///
    /// The leader's error is captured once and shared with every caller
    /// of the window, so all of them see the same failure.
    #[error("Coalesced call failed: {source}")]
    Coalesced {
        /// The leader's captured error
        #[source]
        source: Arc<Error>,
    },

    /// Configuration or construction-graph error
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found error
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// A service name was registered twice with construction data
    #[error("Service '{name}' already exists")]
    ServiceExists {
        /// The conflicting service name
        name: String,
    },

    /// A service's construction recursed back into itself
    #[error("Circular dependency while building service '{name}'")]
    CircularDependency {
        /// The service name found on its own resolution stack
        name: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },

    /// Generic string-based error
    #[error("{0}")]
    String(String),
}

impl Error {
    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }

    /// Create a cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a service-already-exists error
    pub fn service_exists<S: Into<String>>(name: S) -> Self {
        Self::ServiceExists { name: name.into() }
    }

    /// Create a circular dependency error
    pub fn circular_dependency<S: Into<String>>(name: S) -> Self {
        Self::CircularDependency { name: name.into() }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error is a bounded-wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Duplicate this error for sharing with other callers
    ///
    /// Keeps the variant and message. Wrapped source errors that cannot
    /// be duplicated (`Io`, `Json`, `Config`) are rebuilt from their
    /// display form, so the copy compares and matches like the original
    /// but does not carry the source's backtrace or downcasts.
    pub fn snapshot(&self) -> Self {
        match self {
            Self::Io { source } => Self::Io {
                source: std::io::Error::new(source.kind(), source.to_string()),
            },
            Self::Json { source } => Self::Json {
                source: serde::de::Error::custom(source.to_string()),
            },
            Self::Timeout { operation } => Self::Timeout {
                operation: operation.clone(),
            },
            Self::Cache { message } => Self::Cache {
                message: message.clone(),
            },
            Self::Coalesced { source } => Self::Coalesced {
                source: Arc::clone(source),
            },
            Self::Config { message, source } => Self::Config {
                message: message.clone(),
                source: source.as_ref().map(|s| s.to_string().into()),
            },
            Self::NotFound { resource } => Self::NotFound {
                resource: resource.clone(),
            },
            Self::ServiceExists { name } => Self::ServiceExists { name: name.clone() },
            Self::CircularDependency { name } => Self::CircularDependency { name: name.clone() },
            Self::Internal { message } => Self::Internal {
                message: message.clone(),
            },
            Self::String(message) => Self::String(message.clone()),
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_preserves_variant_and_message() {
        let err = Error::timeout("channel pop");
        let copy = err.snapshot();
        assert!(copy.is_timeout());
        assert_eq!(copy.to_string(), err.to_string());

        let err = Error::internal("upstream down");
        assert!(matches!(err.snapshot(), Error::Internal { .. }));
    }

    #[test]
    fn snapshot_rebuilds_wrapped_sources() {
        let err = Error::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing file",
        ));
        let copy = err.snapshot();
        assert!(matches!(copy, Error::Io { .. }));
        assert_eq!(copy.to_string(), err.to_string());
    }
}
