// src/db/mod.rs

//! SQLite persistence for the chaincode registry
//!
//! One database file per peer holds the `chaincodes` table; payload bytes
//! live next to it in the CAS objects directory (see [`paths`]).

pub mod models;
pub mod paths;
pub mod schema;

use crate::error::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits on a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create the database (and its parent directory) and bring the schema up to date
pub fn init(db_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let conn = open(db_path)?;
    schema::migrate(&conn)?;
    info!("Initialized chaincode database at {}", db_path);
    Ok(())
}

/// Open a connection with the pragmas every registry connection needs
///
/// WAL journaling lets readers keep a committed snapshot while a writer
/// is inside a transaction.
pub fn open(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;

    let mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
    debug!("Opened {} (journal_mode={})", db_path, mode);

    Ok(conn)
}

/// Run `f` inside an IMMEDIATE transaction, committing on success
///
/// IMMEDIATE takes the write lock up front, so a check-then-insert inside
/// `f` cannot interleave with another writer on the same database file.
/// Any error from `f` rolls the transaction back.
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
