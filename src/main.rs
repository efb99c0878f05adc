// src/main.rs

use anyhow::Result;
use ccstore::{BuildRoot, Config};
use clap::Parser;
use std::path::PathBuf;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db_path {
        config.storage.db_path = db_path;
    }

    match cli.command {
        Commands::Init => commands::cmd_init(&config),
        Commands::Package {
            path,
            output,
            spec,
            root,
        } => {
            apply_root(&mut config, root);
            commands::cmd_package(&config, &path, &spec, &output)
        }
        Commands::Install {
            name,
            version,
            path,
            package,
            root,
        } => {
            apply_root(&mut config, root);
            commands::cmd_install(&config, &name, &version, &path, package.as_deref())
        }
        Commands::List { name, json } => commands::cmd_list(&config, name.as_deref(), json),
        Commands::Show {
            name,
            version,
            json,
        } => commands::cmd_show(&config, &name, &version, json),
    }
}

/// Command-line root wins over config; the result also seeds the shared build root
fn apply_root(config: &mut Config, root: Option<PathBuf>) {
    if root.is_some() {
        config.build.deploy_root = root;
    }
    BuildRoot::global().set(config.build.deploy_root.clone());
}
