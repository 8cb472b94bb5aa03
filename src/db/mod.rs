// src/db/mod.rs
//
// Database module
//
// Provides:
// - Connection pooling
// - Schema migrations
// - Database utilities

pub mod connection;
pub mod migrations;

pub use connection::{
    create_connection_pool, create_in_memory_pool, get_connection, get_database_path,
    ConnectionPool, PooledConn,
};

pub use migrations::{
    get_database_stats, initialize_database, verify_database_integrity, DatabaseStats,
};

use crate::error::AppResult;

/// Open (or create) the plan database, bring its schema up to date and
/// refuse a file that fails SQLite's integrity check.
pub fn open_plan_database(db_path: &std::path::Path) -> AppResult<ConnectionPool> {
    let pool = create_connection_pool(db_path)?;
    let conn = get_connection(&pool)?;
    initialize_database(&conn)?;
    verify_database_integrity(&conn)?;
    Ok(pool)
}

/// In-memory plan database with the schema applied, for tests and dry runs.
pub fn open_in_memory_plan_database() -> AppResult<ConnectionPool> {
    let pool = create_in_memory_pool()?;
    {
        let conn = get_connection(&pool)?;
        initialize_database(&conn)?;
    }
    Ok(pool)
}
