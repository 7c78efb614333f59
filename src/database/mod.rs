use anyhow::{Context, Result};
use log::{debug, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

use crate::config::DatabaseConfig;

mod migrations;
mod schema;
pub mod models;

#[cfg(test)]
mod tests;

/// Shared SQLite connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of the pool
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Open (creating if needed) the database and bring its schema up to date
pub fn initialize(config: &DatabaseConfig) -> Result<DbPool> {
    let db_path = &config.path;

    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }
    }

    let db_exists = Path::new(db_path).exists();

    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
    });

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .context("Failed to create database connection pool")?;

    let mut conn = pool.get().context("Failed to get a database connection")?;

    if !db_exists {
        debug!("Creating new database at {}", db_path);
    } else {
        debug!("Using existing database at {}", db_path);
    }

    schema::create_schema(&mut conn).context("Failed to create database schema")?;
    migrations::run_migrations(&mut conn).context("Failed to migrate database")?;

    info!("Database initialized at {}", db_path);
    Ok(pool)
}

/// Get a connection from the pool
pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get().context("Failed to get a database connection")
}
