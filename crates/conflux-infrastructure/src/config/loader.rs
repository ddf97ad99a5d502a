//! Service graph document loader
//!
//! Scans a directory tree for TOML files and merges them, in sorted
//! path order, into one document map. Environment variables with the
//! configured prefix override file values (e.g. `CONFLUX_REDIS__HOST`
//! overrides `redis.host`). Uses Figment for the merge semantics.

use conflux_domain::error::{Error, Result};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Default environment variable prefix
pub const DEFAULT_ENV_PREFIX: &str = "CONFLUX";

/// Loads service graph documents from a directory of TOML files
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directory scanned for `.toml` files
    dir: PathBuf,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a loader rooted at `dir` with the default prefix
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// The directory this loader scans
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load and merge every document source
    ///
    /// Sources are merged in this order (later sources override earlier):
    /// 1. TOML files under the directory, in sorted path order
    /// 2. Environment variables with the prefix, `__` separating
    ///    nested keys
    pub fn load(&self) -> Result<Map<String, Value>> {
        let mut files = Vec::new();
        collect_toml_files(&self.dir, &mut files)?;
        files.sort();

        let mut figment = Figment::new();
        for file in &files {
            figment = figment.merge(Toml::file(file));
            tracing::debug!(file = %file.display(), "merged configuration file");
        }
        figment = figment.merge(Env::prefixed(&format!("{}_", self.env_prefix)).split("__"));

        let value: Value = figment
            .extract()
            .map_err(|err| Error::config_with_source("failed to merge configuration", err))?;
        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(Error::config("configuration root must be a table")),
        }
    }
}

fn collect_toml_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.exists() {
        return Err(Error::not_found(format!(
            "configuration directory '{}'",
            dir.display()
        )));
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_toml_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            out.push(path);
        }
    }
    Ok(())
}
