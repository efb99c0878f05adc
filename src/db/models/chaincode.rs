// src/db/models/chaincode.rs

//! Chaincode model - one row per installed (name, version)

use crate::error::Result;
use crate::hash::{self, HashAlgorithm};
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str =
    "id, name, version, path, payload_hash, payload_size, hash_algorithm, installed_at";

/// An installed chaincode package record
///
/// The payload itself lives in the CAS under `payload_hash`; rows are
/// never updated once inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chaincode {
    pub id: Option<i64>,
    pub name: String,
    pub version: String,
    pub path: String,
    pub payload_hash: String,
    pub payload_size: u64,
    pub hash_algorithm: HashAlgorithm,
    pub installed_at: Option<String>,
}

impl Chaincode {
    /// Create a new, not yet inserted, record
    pub fn new(
        name: String,
        version: String,
        path: String,
        payload_hash: String,
        payload_size: u64,
    ) -> Self {
        Self {
            id: None,
            name,
            version,
            path,
            payload_hash,
            payload_size,
            hash_algorithm: HashAlgorithm::Sha256,
            installed_at: None,
        }
    }

    /// Insert this record into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO chaincodes (name, version, path, payload_hash, payload_size, hash_algorithm)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &self.name,
                &self.version,
                &self.path,
                &self.payload_hash,
                self.payload_size as i64,
                self.hash_algorithm.name(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        self.installed_at = conn
            .query_row(
                "SELECT installed_at FROM chaincodes WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Find the record for an install key
    pub fn find_by_key(conn: &Connection, name: &str, version: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM chaincodes WHERE name = ?1 AND version = ?2"
        ))?;

        let chaincode = stmt
            .query_row(params![name, version], Self::from_row)
            .optional()?;

        Ok(chaincode)
    }

    /// Find every installed version of a chaincode
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM chaincodes WHERE name = ?1 ORDER BY version"
        ))?;

        let chaincodes = stmt
            .query_map([name], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(chaincodes)
    }

    /// List all installed chaincodes
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM chaincodes ORDER BY name, version"
        ))?;

        let chaincodes = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(chaincodes)
    }

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let algorithm_str: String = row.get(6)?;
        let hash_algorithm = algorithm_str.parse::<HashAlgorithm>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;

        let payload_hash: String = row.get(4)?;
        if !hash::is_valid_digest(hash_algorithm, &payload_hash) {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("not a {hash_algorithm} digest: {payload_hash}"),
                )),
            ));
        }

        let payload_size: i64 = row.get(5)?;

        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            version: row.get(2)?,
            path: row.get(3)?,
            payload_hash,
            payload_size: payload_size as u64,
            hash_algorithm,
            installed_at: row.get(7)?,
        })
    }
}
