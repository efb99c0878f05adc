// src/config.rs
//! Configuration file parsing for the chaincode registry
//!
//! Supports a TOML configuration file with the following sections:
//! - [storage] - Database location, payload hash algorithm
//! - [build] - Deployment root for path-based packaging
//!
//! Environment variables override the file:
//! - `CCSTORE_DB_PATH`
//! - `CCSTORE_DEPLOY_ROOT`

use crate::db::paths::DEFAULT_DB_PATH;
use crate::error::{Error, Result};
use crate::hash::HashAlgorithm;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "CCSTORE_DB_PATH";
pub const ENV_DEPLOY_ROOT: &str = "CCSTORE_DEPLOY_ROOT";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub build: BuildSection,
}

/// Storage configuration section
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    /// Database file; payload objects live in `objects/` beside it
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Hash algorithm used to address newly installed payloads
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            hash_algorithm: HashAlgorithm::default(),
        }
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

/// Packaging configuration section
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Directory under which `src/<path>` chaincode sources resolve
    pub deploy_root: Option<PathBuf>,
}

impl Config {
    /// Load configuration from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            self.storage.db_path = db_path;
        }
        if let Some(root) = lookup(ENV_DEPLOY_ROOT).filter(|v| !v.is_empty()) {
            self.build.deploy_root = Some(PathBuf::from(root));
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if self.storage.db_path.is_empty() {
            return Err(Error::Config("storage.db_path must not be empty".to_string()));
        }
        if self
            .build
            .deploy_root
            .as_ref()
            .is_some_and(|root| root.as_os_str().is_empty())
        {
            return Err(Error::Config("build.deploy_root must not be empty".to_string()));
        }
        Ok(())
    }
}
