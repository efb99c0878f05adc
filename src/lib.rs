// src/lib.rs

//! ccstore - chaincode installation registry
//!
//! Keeps, per peer, the set of installed chaincode packages keyed by
//! `(name, version)`, and builds those packages from source trees or
//! accepts them as raw bytes.
//!
//! # Architecture
//!
//! - Database-first: install records live in SQLite, one row per key
//! - Content-addressed payloads: package bytes are stored once per hash
//! - Append-only keys: an occupied `(name, version)` is never overwritten
//! - Reproducible packaging: identical source trees give identical payloads

pub mod config;
pub mod db;
mod error;
pub mod filesystem;
pub mod hash;
pub mod package;
pub mod registry;

pub use config::Config;
pub use error::{Error, Result};
pub use hash::HashAlgorithm;
pub use package::{BuildRoot, BuildRootGuard, ChaincodePackage, PackageBuilder, PackageSource};
pub use registry::{ChaincodeInfo, InstallRegistry};
