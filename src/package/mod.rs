// src/package/mod.rs

//! Installable chaincode packages
//!
//! A [`ChaincodePackage`] is the uniform artifact handed to the registry,
//! whether it was serialized from a source tree by [`PackageBuilder`] or
//! supplied by the caller as raw bytes.

mod build_root;
mod builder;

pub use build_root::{BuildRoot, BuildRootGuard};
pub use builder::{PACKAGE_MTIME, PackageBuilder};

use crate::hash::{self, HashAlgorithm};
use std::path::PathBuf;

/// Where a package's payload came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    /// Serialized from a source directory
    Path {
        source_dir: PathBuf,
        file_count: usize,
    },
    /// Supplied as a pre-built blob
    Bytes,
}

/// A built, byte-serialized chaincode package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodePackage {
    /// Logical source path the package was built from, empty for raw bytes
    pub path: String,
    pub payload: Vec<u8>,
    pub source: PackageSource,
}

impl ChaincodePackage {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Content digest of the payload
    pub fn digest(&self, algorithm: HashAlgorithm) -> String {
        hash::hash_bytes(algorithm, &self.payload)
    }
}
