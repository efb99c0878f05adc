// src/commands/query.rs

//! Installed chaincode query commands

use super::open_registry;
use anyhow::{Result, bail};
use ccstore::{ChaincodeInfo, Config};

/// List installed chaincodes, optionally only the versions of one name
pub fn cmd_list(config: &Config, name: Option<&str>, json: bool) -> Result<()> {
    let registry = open_registry(config)?;

    let chaincodes = match name {
        Some(name) => registry.find_by_name(name)?,
        None => registry.list_installed()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&chaincodes)?);
        return Ok(());
    }

    if chaincodes.is_empty() {
        println!("No chaincodes installed.");
        return Ok(());
    }

    println!("Installed chaincodes:");
    for cc in &chaincodes {
        println!("  {} {} [{}] id={}", cc.name, cc.version, display_path(cc), short_id(&cc.id));
    }
    println!("\nTotal: {} chaincode(s)", chaincodes.len());

    Ok(())
}

/// Show a single installed chaincode
pub fn cmd_show(config: &Config, name: &str, version: &str, json: bool) -> Result<()> {
    let registry = open_registry(config)?;

    let Some(cc) = registry.get(name, version)? else {
        bail!("chaincode {} version {} is not installed", name, version);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&cc)?);
        return Ok(());
    }

    println!("Name:      {}", cc.name);
    println!("Version:   {}", cc.version);
    println!("Path:      {}", display_path(&cc));
    println!("Id:        {}", cc.id);
    println!("Size:      {} bytes", cc.size);
    if let Some(at) = cc.installed_at {
        println!("Installed: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    Ok(())
}

fn display_path(cc: &ChaincodeInfo) -> &str {
    if cc.path.is_empty() { "-" } else { &cc.path }
}

fn short_id(id: &str) -> &str {
    &id[..id.len().min(12)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab");
        assert_eq!(short_id("abc"), "abc");
    }
}
