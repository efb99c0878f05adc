// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use ccstore::{InstallRegistry, PackageBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

pub const CHAINCODE_NAME: &str = "install";
pub const CHAINCODE_PATH: &str = "github.com/example_cc";

/// A peer with its own registry and a deployment root holding example_cc.
///
/// Keep the struct alive; dropping it removes the temp directory.
pub struct TestPeer {
    pub temp_dir: TempDir,
    pub deploy_root: PathBuf,
    pub db_path: String,
    pub registry: InstallRegistry,
}

pub fn setup_peer() -> TestPeer {
    let temp_dir = tempfile::tempdir().unwrap();
    let deploy_root = temp_dir.path().join("gopath");
    write_example_cc(&deploy_root);

    let db_path = temp_dir
        .path()
        .join("peer0/ccstore.db")
        .to_str()
        .unwrap()
        .to_string();

    let registry = InstallRegistry::open(&db_path)
        .unwrap()
        .with_package_builder(PackageBuilder::new(&deploy_root));

    TestPeer {
        temp_dir,
        deploy_root,
        db_path,
        registry,
    }
}

/// Lay out `<root>/src/github.com/example_cc` with a couple of sources
pub fn write_example_cc(root: &Path) {
    let dir = root.join("src").join(CHAINCODE_PATH);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("example_cc.go"),
        "package main\n\nfunc main() {}\n",
    )
    .unwrap();
    fs::write(dir.join("README.md"), "example chaincode\n").unwrap();
}

/// A fresh version string per call, so tests never collide on a key
pub fn next_version() -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    format!("v0{}", 1000 + COUNTER.fetch_add(1, Ordering::SeqCst))
}
