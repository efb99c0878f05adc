// src/commands/package.rs

//! Build a chaincode package file from source

use anyhow::{Context, Result};
use ccstore::{BuildRoot, Config, PackageBuilder};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Package the sources for `path` and write the result to `output`
pub fn cmd_package(config: &Config, path: &str, spec: &str, output: &Path) -> Result<()> {
    let builder = match &config.build.deploy_root {
        Some(root) => PackageBuilder::new(root),
        None => PackageBuilder::from_build_root(BuildRoot::global())?,
    };

    let package = builder
        .build_from_path(path, spec)
        .with_context(|| format!("Failed to package {}", path))?;

    // Stage next to the output so a failed write never leaves a truncated package
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create staging file in {}", dir.display()))?;
    staged.write_all(package.payload())?;
    staged
        .persist(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote package for {} to {}", path, output.display());
    println!(
        "Packaged {} ({} bytes, sha256 {}) -> {}",
        path,
        package.len(),
        package.digest(ccstore::HashAlgorithm::Sha256),
        output.display()
    );
    Ok(())
}
