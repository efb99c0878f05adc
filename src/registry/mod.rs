// src/registry/mod.rs

//! Chaincode installation registry
//!
//! The registry owns one peer's mapping from install key `(name, version)`
//! to installed package. It is append-only for a given key: the first
//! successful install occupies the slot and every later install of the same
//! key fails with [`Error::DuplicateInstall`], whatever its path or payload.
//!
//! # Concurrency
//!
//! An `InstallRegistry` is `Send + Sync` and meant to be shared behind an
//! `Arc`. Installs go through a single writer connection: the writer mutex
//! serializes callers in this process and an IMMEDIATE transaction
//! serializes other processes on the same database, so check-then-insert is
//! atomic. Queries use a separate reader connection; with WAL journaling
//! they see the last committed state and never wait on an in-flight install.

use crate::config::Config;
use crate::db::{self, models::Chaincode, paths};
use crate::error::{Error, Result};
use crate::filesystem::CasStore;
use crate::hash::HashAlgorithm;
use crate::package::{BuildRoot, ChaincodePackage, PackageBuilder};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Installed chaincode as reported by queries
///
/// `id` is the payload's content hash, so two installs of byte-identical
/// packages report the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChaincodeInfo {
    pub name: String,
    pub version: String,
    pub path: String,
    pub id: String,
    pub size: u64,
    pub installed_at: Option<DateTime<Utc>>,
}

impl From<Chaincode> for ChaincodeInfo {
    fn from(record: Chaincode) -> Self {
        let installed_at = record
            .installed_at
            .as_deref()
            .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
            .map(|naive| naive.and_utc());

        Self {
            name: record.name,
            version: record.version,
            path: record.path,
            id: record.payload_hash,
            size: record.payload_size,
            installed_at,
        }
    }
}

/// Per-peer chaincode installation registry
pub struct InstallRegistry {
    db_path: String,
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    cas: CasStore,
    builder: Option<PackageBuilder>,
}

impl InstallRegistry {
    /// Open (creating if needed) the registry stored at `db_path`
    pub fn open(db_path: &str) -> Result<Self> {
        Self::open_with_algorithm(db_path, HashAlgorithm::Sha256)
    }

    /// Open the registry, addressing new payloads with `algorithm`
    pub fn open_with_algorithm(db_path: &str, algorithm: HashAlgorithm) -> Result<Self> {
        db::init(db_path)?;

        let writer = db::open(db_path)?;
        let reader = db::open(db_path)?;
        let cas = CasStore::with_algorithm(paths::objects_dir(db_path), algorithm)?;

        debug!("Opened install registry at {}", db_path);

        Ok(Self {
            db_path: db_path.to_string(),
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
            cas,
            builder: None,
        })
    }

    /// Open the registry described by a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Self::open_with_algorithm(&config.storage.db_path, config.storage.hash_algorithm)?;
        Ok(match &config.build.deploy_root {
            Some(root) => registry.with_package_builder(PackageBuilder::new(root)),
            None => registry,
        })
    }

    /// Use `builder` for path-based installs instead of the shared build root
    pub fn with_package_builder(mut self, builder: PackageBuilder) -> Self {
        self.builder = Some(builder);
        self
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Install a chaincode under `(name, version)`
    ///
    /// With `payload` set, the bytes are installed as-is and `path` is only
    /// recorded. Without it, the sources at `path` are packaged under the
    /// registry's deployment root first.
    pub fn install(
        &self,
        name: &str,
        path: &str,
        version: &str,
        payload: Option<&[u8]>,
    ) -> Result<ChaincodeInfo> {
        validate_install(name, path, version, payload)?;

        // An occupied key is reported before any packaging work
        if self.get(name, version)?.is_some() {
            let err = Error::duplicate(name, version);
            warn!("Rejected install: {}", err);
            return Err(err);
        }

        match payload {
            Some(bytes) => self.insert(name, path, version, bytes),
            None => {
                let package = self.path_builder()?.build_from_path(path, "")?;
                self.insert(name, path, version, package.payload())
            }
        }
    }

    /// Install an already built package, recording its source path
    pub fn install_package(
        &self,
        name: &str,
        version: &str,
        package: &ChaincodePackage,
    ) -> Result<ChaincodeInfo> {
        self.install(name, &package.path, version, Some(package.payload()))
    }

    /// Every installed chaincode, ordered by name then version
    pub fn list_installed(&self) -> Result<Vec<ChaincodeInfo>> {
        let conn = self.reader();
        let records = Chaincode::list_all(&conn)?;
        Ok(records.into_iter().map(ChaincodeInfo::from).collect())
    }

    /// Look up a single install key
    pub fn get(&self, name: &str, version: &str) -> Result<Option<ChaincodeInfo>> {
        let conn = self.reader();
        Ok(Chaincode::find_by_key(&conn, name, version)?.map(ChaincodeInfo::from))
    }

    /// Every installed version of `name`
    pub fn find_by_name(&self, name: &str) -> Result<Vec<ChaincodeInfo>> {
        let conn = self.reader();
        let records = Chaincode::find_by_name(&conn, name)?;
        Ok(records.into_iter().map(ChaincodeInfo::from).collect())
    }

    /// Read back the payload installed under `(name, version)`
    pub fn payload(&self, name: &str, version: &str) -> Result<Vec<u8>> {
        let record = {
            let conn = self.reader();
            Chaincode::find_by_key(&conn, name, version)?
        }
        .ok_or_else(|| Error::NotFound(format!("chaincode {name} version {version}")))?;

        if record.hash_algorithm == self.cas.algorithm() {
            self.cas.retrieve(&record.payload_hash)
        } else {
            CasStore::with_algorithm(self.cas.objects_dir(), record.hash_algorithm)?
                .retrieve(&record.payload_hash)
        }
    }

    fn insert(&self, name: &str, path: &str, version: &str, payload: &[u8]) -> Result<ChaincodeInfo> {
        let mut conn = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let result = db::transaction(&mut conn, |tx| {
            if Chaincode::find_by_key(tx, name, version)?.is_some() {
                return Err(Error::duplicate(name, version));
            }

            // Blob before row
            let payload_hash = self.cas.store(payload)?;

            let mut record = Chaincode::new(
                name.to_string(),
                version.to_string(),
                path.to_string(),
                payload_hash,
                payload.len() as u64,
            );
            record.hash_algorithm = self.cas.algorithm();
            record
                .insert(tx)
                .map_err(|e| unique_violation_as_duplicate(e, name, version))?;

            Ok(record)
        });

        match result {
            Ok(record) => {
                info!(
                    "Installed chaincode {} version {} ({} bytes, id {})",
                    record.name, record.version, record.payload_size, record.payload_hash
                );
                Ok(record.into())
            }
            Err(e) => {
                if e.is_duplicate_install() {
                    warn!("Rejected install: {}", e);
                }
                Err(e)
            }
        }
    }

    fn reader(&self) -> MutexGuard<'_, Connection> {
        self.reader.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn path_builder(&self) -> Result<PackageBuilder> {
        match &self.builder {
            Some(builder) => Ok(builder.clone()),
            None => PackageBuilder::from_build_root(BuildRoot::global()),
        }
    }
}

fn validate_install(name: &str, path: &str, version: &str, payload: Option<&[u8]>) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("chaincode name is required".to_string()));
    }
    if version.is_empty() {
        return Err(Error::Validation(format!(
            "chaincode {name}: version is required"
        )));
    }

    match payload {
        Some([]) => Err(Error::Validation(format!(
            "chaincode {name}: package payload is empty"
        ))),
        None if path.is_empty() => Err(Error::Validation(format!(
            "chaincode {name}: a path or a package payload is required"
        ))),
        _ => Ok(()),
    }
}

/// A UNIQUE(name, version) violation means another writer won the slot
fn unique_violation_as_duplicate(err: Error, name: &str, version: &str) -> Error {
    match err {
        Error::Database(rusqlite::Error::SqliteFailure(ref failure, _))
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::duplicate(name, version)
        }
        other => other,
    }
}
