use anyhow::{Context, Result};
use log::debug;
use rusqlite::Connection;

/// Create the database schema
pub fn create_schema(conn: &mut Connection) -> Result<()> {
    debug!("Creating database schema");

    // All tables or none
    let tx = conn.transaction().context("Failed to start transaction for schema creation")?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'advertiser',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    ).context("Failed to create accounts table")?;

    // Append-only
    tx.execute(
        "CREATE TABLE IF NOT EXISTS audit_logs (
            id TEXT PRIMARY KEY,
            event_type TEXT NOT NULL,
            account_id TEXT,
            details TEXT,
            timestamp TEXT NOT NULL
        )",
        [],
    ).context("Failed to create audit_logs table")?;

    tx.execute(
        "CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs(timestamp)",
        [],
    ).context("Failed to create audit timestamp index")?;

    tx.execute(
        "CREATE TRIGGER IF NOT EXISTS audit_logs_no_update
         BEFORE UPDATE ON audit_logs
         BEGIN
             SELECT RAISE(ABORT, 'audit_logs is append-only');
         END",
        [],
    ).context("Failed to create audit update trigger")?;

    tx.execute(
        "CREATE TRIGGER IF NOT EXISTS audit_logs_no_delete
         BEFORE DELETE ON audit_logs
         BEGIN
             SELECT RAISE(ABORT, 'audit_logs is append-only');
         END",
        [],
    ).context("Failed to create audit delete trigger")?;

    tx.commit().context("Failed to commit schema transaction")?;

    debug!("Database schema ready");
    Ok(())
}
