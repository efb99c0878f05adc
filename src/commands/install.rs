// src/commands/install.rs
//! Chaincode installation command

use super::open_registry;
use anyhow::{Context, Result};
use ccstore::{Config, PackageBuilder};
use std::fs;
use std::path::Path;
use tracing::info;

/// Install a chaincode from a package file, or by packaging `path`
///
/// A duplicate install is reported as an error; the registry is left as it was.
pub fn cmd_install(
    config: &Config,
    name: &str,
    version: &str,
    path: &str,
    package_file: Option<&Path>,
) -> Result<()> {
    let registry = open_registry(config)?;

    let info = match package_file {
        Some(file) => {
            let bytes = fs::read(file)
                .with_context(|| format!("Failed to read package {}", file.display()))?;
            let package = PackageBuilder::build_from_bytes(bytes)?;
            info!("Installing {} {} from {}", name, version, file.display());
            registry.install(name, path, version, Some(package.payload()))?
        }
        None => {
            info!("Installing {} {} from source path {}", name, version, path);
            registry.install(name, path, version, None)?
        }
    };

    println!(
        "Installed chaincode {} version {} (id {})",
        info.name, info.version, info.id
    );
    Ok(())
}
