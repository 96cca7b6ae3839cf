//! Database connection pool management.
//!
//! Connection pooling for SQLite using r2d2. Migrations run once when the
//! pool is created.

use std::time::Duration;

use overseer_common::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const POOL_SIZE: u32 = 4;

/// How long a connection waits on a locked database.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Initialize a new database pool with the given file path.
///
/// Creates the SQLite file if needed and runs pending migrations. Each
/// connection waits up to [`BUSY_TIMEOUT`] on a locked database before
/// failing.
///
/// # Example
///
/// ```no_run
/// use overseer_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/overseer/db.sqlite").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));

    build(manager)
}

/// Initialize an in-memory database pool for testing.
///
/// A single connection is used so every checkout sees the same in-memory
/// database.
///
/// ```
/// use overseer_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory();

    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create in-memory pool: {}", e)))?;

    migrate(&pool)?;
    Ok(pool)
}

fn build(manager: SqliteConnectionManager) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {}", e)))?;

    migrate(&pool)?;
    Ok(pool)
}

fn migrate(pool: &DbPool) -> Result<()> {
    let conn = get_conn(pool)?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

    Ok(())
}

/// Get a connection from the pool.
///
/// Converts the r2d2 error into the common [`Error`] type.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
}
