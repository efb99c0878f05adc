// src/cli.rs
//! CLI definitions for the ccstore registry
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ccstore")]
#[command(author = "ccstore Contributors")]
#[command(version)]
#[command(about = "Chaincode installation registry for a peer", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the database file (overrides config and CCSTORE_DB_PATH)
    #[arg(short, long, global = true)]
    pub db_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the registry database
    Init,

    /// Build a chaincode package from source
    Package {
        /// Logical chaincode path (e.g. github.com/example_cc)
        path: String,

        /// Output file for the package
        #[arg(short, long)]
        output: PathBuf,

        /// Source directory to package instead of <root>/src/<path>
        #[arg(long, default_value = "")]
        spec: String,

        /// Deployment root (overrides config and CCSTORE_DEPLOY_ROOT)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Install a chaincode
    Install {
        /// Chaincode name
        name: String,

        /// Chaincode version
        version: String,

        /// Logical chaincode path; packaged from the deployment root unless --package is given
        #[arg(short, long, default_value = "")]
        path: String,

        /// Pre-built package file to install as-is
        #[arg(long)]
        package: Option<PathBuf>,

        /// Deployment root (overrides config and CCSTORE_DEPLOY_ROOT)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// List installed chaincodes
    List {
        /// Only show versions of this chaincode
        name: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one installed chaincode
    Show {
        name: String,
        version: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
