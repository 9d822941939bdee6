//! Diff configuration, read from a TOML file with environment overrides.
//!
//! ```toml
//! strategy = "native"
//! context_lines = 3
//! detect_renames = false
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::{strategy::DiffStrategy, Error, Result};

/// Environment variable overriding [`DiffConfig::strategy`].
pub const STRATEGY_ENV: &str = "GITBATCH_DIFF_STRATEGY";

const DEFAULT_CONTEXT_LINES: u32 = 3;

/// Settings consumed by the diff pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Backend used to produce patches.
    pub strategy: DiffStrategy,
    /// Unchanged lines shown around each hunk.
    pub context_lines: u32,
    /// Pair deletions with additions into renames and copies.
    pub detect_renames: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            strategy: DiffStrategy::default(),
            context_lines: DEFAULT_CONTEXT_LINES,
            detect_renames: false,
        }
    }
}

impl DiffConfig {
    /// Read configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::ConfigFile`] if it is not valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| Error::ConfigFile {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parse configuration from an in-memory TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigFile`] when the document is rejected.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|source| Error::ConfigFile {
            path: "<inline>".to_owned(),
            source,
        })
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the override names an unknown strategy.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(std::env::var(STRATEGY_ENV).ok().as_deref())
    }

    fn apply_overrides(mut self, strategy: Option<&str>) -> Result<Self> {
        if let Some(name) = strategy.filter(|name| !name.trim().is_empty()) {
            self.strategy = name.parse()?;
            tracing::debug!(strategy = %self.strategy, "strategy overridden from environment");
        }
        Ok(self)
    }
}
