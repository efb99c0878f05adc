// src/commands/mod.rs
//! Command handlers for the ccstore CLI

mod install;
mod package;
mod query;

pub use install::cmd_install;
pub use package::cmd_package;
pub use query::{cmd_list, cmd_show};

use anyhow::{Context, Result};
use ccstore::Config;
use ccstore::registry::InstallRegistry;

/// Initialize the registry database and objects directory
pub fn cmd_init(config: &Config) -> Result<()> {
    let registry = InstallRegistry::from_config(config)
        .with_context(|| format!("Failed to initialize registry at {}", config.storage.db_path))?;
    println!("Registry initialized at: {}", registry.db_path());
    Ok(())
}

pub(crate) fn open_registry(config: &Config) -> Result<InstallRegistry> {
    InstallRegistry::from_config(config)
        .with_context(|| format!("Failed to open registry at {}", config.storage.db_path))
}
