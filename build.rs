// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: deployment root directory
fn root_arg() -> Arg {
    Arg::new("root")
        .short('r')
        .long("root")
        .value_name("DIR")
        .help("Deployment root (overrides config and CCSTORE_DEPLOY_ROOT)")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON output")
}

fn build_cli() -> Command {
    Command::new("ccstore")
        .version(env!("CARGO_PKG_VERSION"))
        .author("ccstore Contributors")
        .about("Chaincode installation registry for a peer")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("Configuration file (TOML)"),
        )
        .arg(
            Arg::new("db_path")
                .short('d')
                .long("db-path")
                .value_name("PATH")
                .global(true)
                .help("Database path (overrides config and CCSTORE_DB_PATH)"),
        )
        .subcommand(Command::new("init").about("Initialize the registry database"))
        .subcommand(
            Command::new("package")
                .about("Build a chaincode package from source")
                .arg(Arg::new("path").required(true).help("Logical chaincode path"))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .required(true)
                        .help("Output file for the package"),
                )
                .arg(Arg::new("spec").long("spec").help("Source directory to package"))
                .arg(root_arg()),
        )
        .subcommand(
            Command::new("install")
                .about("Install a chaincode")
                .arg(Arg::new("name").required(true).help("Chaincode name"))
                .arg(Arg::new("version").required(true).help("Chaincode version"))
                .arg(Arg::new("path").short('p').long("path").help("Logical chaincode path"))
                .arg(Arg::new("package").long("package").help("Pre-built package file"))
                .arg(root_arg()),
        )
        .subcommand(
            Command::new("list")
                .about("List installed chaincodes")
                .arg(Arg::new("name").help("Only show versions of this chaincode"))
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("Show one installed chaincode")
                .arg(Arg::new("name").required(true))
                .arg(Arg::new("version").required(true))
                .arg(json_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    if let Err(e) = fs::write(man_dir.join("ccstore.1"), buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
