// src/db/connection.rs
//
// SQLite access for the library file
//
// Every connection handed out, pooled or in-memory, has foreign keys on.
// An enrichment run checks out a single connection and drives its own
// transactions on it.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// One run plus a concurrent `status` is the expected load
const POOL_SIZE: u32 = 4;

/// Applied to each file-backed connection as the pool opens it
const FILE_PRAGMAS: &str = "PRAGMA foreign_keys = ON;
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA busy_timeout = 5000;";

/// `{data_dir}/vidledger/vidledger.db`
pub fn default_database_path() -> AppResult<PathBuf> {
    dirs::data_dir()
        .map(|base| base.join("vidledger").join("vidledger.db"))
        .ok_or_else(|| AppError::Config("No platform data directory; set database_path".into()))
}

/// Open (creating if needed) the library file behind a small pool
pub fn create_connection_pool(db_path: &Path) -> AppResult<ConnectionPool> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let manager =
        SqliteConnectionManager::file(db_path).with_init(|conn| conn.execute_batch(FILE_PRAGMAS));

    Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("cannot open {}: {}", db_path.display(), e)))
}

pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    Ok(pool.get()?)
}

/// Private in-memory database for tests
pub fn create_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", true)?;
    Ok(conn)
}
