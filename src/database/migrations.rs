use anyhow::{Context, Result};
use log::{debug, info, warn};
use rusqlite::Connection;

// Database schema version
const CURRENT_VERSION: u32 = 1;

/// Run any necessary database migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    debug!("Checking database version");

    let version = get_database_version(conn)?;

    if version == CURRENT_VERSION {
        debug!("Database schema is up to date (version {})", version);
        return Ok(());
    }

    info!("Migrating database from version {} to {}", version, CURRENT_VERSION);

    let tx = conn.transaction().context("Failed to start transaction for migrations")?;

    for v in version..CURRENT_VERSION {
        let migration_fn = match v {
            0 => migrate_v0_to_v1,
            _ => {
                warn!("No migration function found for version {}", v);
                continue;
            }
        };

        debug!("Running migration from version {} to {}", v, v + 1);
        migration_fn(&tx).context(format!("Failed to migrate from version {} to {}", v, v + 1))?;
    }

    set_database_version(&tx, CURRENT_VERSION)?;

    tx.commit().context("Failed to commit migration transaction")?;

    info!("Database migration completed successfully to version {}", CURRENT_VERSION);
    Ok(())
}

/// Get the current database version, creating the version table on first use
fn get_database_version(conn: &Connection) -> Result<u32> {
    let version_table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='database_version')",
        [],
        |row| row.get(0),
    ).context("Failed to look up database_version table")?;

    if !version_table_exists {
        conn.execute(
            "CREATE TABLE database_version (version INTEGER NOT NULL)",
            [],
        ).context("Failed to create database_version table")?;

        conn.execute(
            "INSERT INTO database_version (version) VALUES (0)",
            [],
        ).context("Failed to initialize database version")?;

        return Ok(0);
    }

    let version: u32 = conn.query_row(
        "SELECT version FROM database_version",
        [],
        |row| row.get(0),
    ).context("Failed to get database version")?;

    Ok(version)
}

/// Set the database version
fn set_database_version(conn: &Connection, version: u32) -> Result<()> {
    conn.execute(
        "UPDATE database_version SET version = ?",
        [version],
    ).context("Failed to update database version")?;

    Ok(())
}

/// Version 1: index audit rows by account
fn migrate_v0_to_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_logs_account_id ON audit_logs(account_id)",
        [],
    ).context("Failed to create audit account index")?;

    debug!("Migration from version 0 to 1 completed");
    Ok(())
}
