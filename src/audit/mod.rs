//! Append-only audit trail for authentication events.
//!
//! Rows are written on the same connection as the operation they describe.
//! A failed audit write is logged and never fails the operation itself.

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection};

use crate::database::models::{AuditEventType, AuditLog};

/// Append an audit event
pub fn record(
    conn: &Connection,
    event_type: AuditEventType,
    account_id: Option<&str>,
    details: Option<&str>,
) {
    let log = AuditLog::new(
        event_type,
        account_id.map(|s| s.to_string()),
        details.map(|s| s.to_string()),
    );

    let result = conn.execute(
        "INSERT INTO audit_logs (id, event_type, account_id, details, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            log.id,
            log.event_type.as_str(),
            log.account_id,
            log.details,
            log.timestamp.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => debug!("Audit event recorded: {} - {}", log.id, event_type.as_str()),
        Err(e) => warn!("Failed to record audit event {}: {}", event_type.as_str(), e),
    }
}

/// Most recent audit events, newest first
pub fn recent_events(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<AuditLog>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_type, account_id, details, timestamp
         FROM audit_logs
         ORDER BY timestamp DESC, rowid DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit as i64], |row| {
        let event_str: String = row.get(1)?;
        let event_type = AuditEventType::from_str(&event_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;

        let ts_str: String = row.get(4)?;
        let timestamp = DateTime::parse_from_rfc3339(&ts_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
            })?;

        Ok(AuditLog {
            id: row.get(0)?,
            event_type,
            account_id: row.get(2)?,
            details: row.get(3)?,
            timestamp,
        })
    })?;

    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database;
    use tempfile::tempdir;

    #[test]
    fn test_record_and_read_back() {
        let dir = tempdir().unwrap();
        let pool = database::initialize(&DatabaseConfig {
            path: dir.path().join("audit.db").to_str().unwrap().to_string(),
            max_connections: 1,
        })
        .unwrap();
        let conn = database::get_connection(&pool).unwrap();

        record(&conn, AuditEventType::AccountCreated, Some("acc-1"), Some("a@b.com"));
        record(&conn, AuditEventType::LoginFailed, None, Some("unknown account"));

        let events = recent_events(&conn, 10).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::LoginFailed);
        assert_eq!(events[0].account_id, None);
        assert_eq!(events[1].event_type, AuditEventType::AccountCreated);
        assert_eq!(events[1].account_id.as_deref(), Some("acc-1"));

        assert_eq!(recent_events(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_record_without_table_does_not_panic() {
        let conn = Connection::open_in_memory().unwrap();
        record(&conn, AuditEventType::LoginSucceeded, Some("acc-1"), None);
    }
}
