// src/db/paths.rs
//! Centralized path derivation for registry directories

use std::path::{Path, PathBuf};

/// Default database location for a peer
pub const DEFAULT_DB_PATH: &str = "/var/lib/ccstore/ccstore.db";

/// Get the directory containing the database
pub fn db_dir(db_path: &str) -> PathBuf {
    Path::new(db_path)
        .parent()
        .unwrap_or(Path::new("/var/lib/ccstore"))
        .to_path_buf()
}

/// Get the payload objects (CAS) directory
pub fn objects_dir(db_path: &str) -> PathBuf {
    db_dir(db_path).join("objects")
}
