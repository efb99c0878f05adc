// src/db/schema.rs

//! Database schema definitions and migrations
//!
//! Migrations are applied in order and recorded in `schema_version`, so
//! opening an older database upgrades it in place.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(Error::Corrupt(format!("unknown migration version: {version}"))),
    }
}

/// Initial schema
///
/// One row per installed chaincode. `(name, version)` is the install key;
/// `path` is descriptive only.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE chaincodes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK(length(name) > 0),
            version TEXT NOT NULL CHECK(length(version) > 0),
            path TEXT NOT NULL,
            payload_hash TEXT NOT NULL,
            payload_size INTEGER NOT NULL,
            installed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(name, version)
        );

        CREATE INDEX idx_chaincodes_name ON chaincodes(name);
        ",
    )?;
    Ok(())
}

/// Record which hash algorithm addressed each payload
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        ALTER TABLE chaincodes ADD COLUMN hash_algorithm TEXT NOT NULL DEFAULT 'sha256';
        CREATE INDEX idx_chaincodes_payload ON chaincodes(payload_hash);
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        (temp_file, conn)
    }

    #[test]
    fn test_migrate_fresh_database() {
        let (_temp, conn) = create_test_db();
        assert_eq!(get_schema_version(&conn).unwrap(), 0);

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let (_temp, conn) = create_test_db();

        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_from_v1() {
        let (_temp, conn) = create_test_db();
        init_schema_version(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        set_schema_version(&conn, 1).unwrap();
        conn.execute(
            "INSERT INTO chaincodes (name, version, path, payload_hash, payload_size)
             VALUES ('old', 'v1', 'p', 'abcd', 4)",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();

        let algorithm: String = conn
            .query_row(
                "SELECT hash_algorithm FROM chaincodes WHERE name = 'old'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(algorithm, "sha256");
    }

    #[test]
    fn test_install_key_is_unique() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        let insert = "INSERT INTO chaincodes (name, version, path, payload_hash, payload_size)
                      VALUES (?1, ?2, ?3, 'abcd', 4)";
        conn.execute(insert, ["install", "v1", "github.com/a"]).unwrap();

        // path differs, key does not
        let result = conn.execute(insert, ["install", "v1", "github.com/b"]);
        assert!(result.is_err());

        conn.execute(insert, ["install", "v2", "github.com/a"]).unwrap();
    }

    #[test]
    fn test_empty_name_rejected() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO chaincodes (name, version, path, payload_hash, payload_size)
             VALUES ('', 'v1', 'p', 'abcd', 4)",
            [],
        );
        assert!(result.is_err());
    }
}
