// src/filesystem/cas.rs

//! Content-addressable storage (CAS) for chaincode payloads
//!
//! Payloads are stored by their content hash, so two chaincodes built from
//! the same sources share one object. Objects are write-once: a stored blob
//! is never rewritten, and every read is checked against its hash.

use crate::error::{Error, Result};
use crate::hash::{self, HashAlgorithm};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Content-addressable storage manager
#[derive(Debug, Clone)]
pub struct CasStore {
    /// Root directory for object storage (e.g., /var/lib/ccstore/objects)
    objects_dir: PathBuf,
    algorithm: HashAlgorithm,
}

impl CasStore {
    /// Open a store with a specific hash algorithm, creating the directory if needed
    pub fn with_algorithm<P: AsRef<Path>>(objects_dir: P, algorithm: HashAlgorithm) -> Result<Self> {
        let objects_dir = objects_dir.as_ref().to_path_buf();

        if !objects_dir.exists() {
            fs::create_dir_all(&objects_dir)?;
            debug!(
                "Created CAS objects directory: {:?} (algorithm: {})",
                objects_dir, algorithm
            );
        }

        Ok(Self {
            objects_dir,
            algorithm,
        })
    }

    #[inline]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Store content and return its hash
    ///
    /// The content is stored at: objects/{first2}/{rest_of_hash}.
    /// Storing content that is already present is a no-op.
    pub fn store(&self, content: &[u8]) -> Result<String> {
        let hash = self.compute_hash(content);
        let path = self.hash_to_path(&hash);

        if self.exists(&hash) {
            debug!("Payload already in CAS: {}", hash);
            return Ok(hash);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write to a unique temp file beside the target, then rename into place
        let parent = path.parent().unwrap_or(&self.objects_dir);
        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        temp.write_all(content)?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        debug!("Stored payload in CAS: {} ({} bytes)", hash, content.len());
        Ok(hash)
    }

    /// Retrieve content by hash, verifying it still matches
    pub fn retrieve(&self, hash: &str) -> Result<Vec<u8>> {
        if !self.exists(hash) {
            return Err(Error::NotFound(format!("payload not found in CAS: {hash}")));
        }

        let path = self.hash_to_path(hash);
        let content = fs::read(&path)?;

        let computed = self.compute_hash(&content);
        if computed != hash {
            return Err(Error::Corrupt(format!(
                "hash mismatch for {}: expected {}, got {}",
                path.display(),
                hash,
                computed
            )));
        }

        debug!("Retrieved payload from CAS: {} ({} bytes)", hash, content.len());
        Ok(content)
    }

    pub fn exists(&self, hash: &str) -> bool {
        self.hash_to_path(hash).exists()
    }

    /// Filesystem path for a given hash
    ///
    /// Example: abc123... -> objects/ab/c123...
    pub fn hash_to_path(&self, hash: &str) -> PathBuf {
        if hash.len() < 2 {
            return self.objects_dir.join(hash);
        }

        let (prefix, suffix) = hash.split_at(2);
        self.objects_dir.join(prefix).join(suffix)
    }

    pub fn compute_hash(&self, content: &[u8]) -> String {
        hash::hash_bytes(self.algorithm, content)
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }
}
