use rusqlite::params;
use tempfile::tempdir;

use crate::config::DatabaseConfig;
use crate::database::{self, models::*};

/// Test fixture for database tests
fn setup_test_db() -> (tempfile::TempDir, database::DbPool) {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("data").join("test_db.db");

    let config = DatabaseConfig {
        path: db_path.to_str().unwrap().to_string(),
        max_connections: 2,
    };

    let pool = database::initialize(&config).unwrap();
    (dir, pool)
}

#[test]
fn test_schema_creation() {
    let (_dir, pool) = setup_test_db();
    let conn = database::get_connection(&pool).unwrap();

    for table in ["accounts", "audit_logs", "database_version"] {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
            [table],
            |row| row.get(0),
        ).unwrap();

        assert!(exists, "Table '{}' should exist", table);
    }

    for index in ["idx_audit_logs_timestamp", "idx_audit_logs_account_id"] {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='index' AND name=?)",
            [index],
            |row| row.get(0),
        ).unwrap();

        assert!(exists, "Index '{}' should exist", index);
    }

    // Email lookups use the index SQLite creates for the UNIQUE constraint
    let email_unique: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM pragma_index_list('accounts') AS il, pragma_index_info(il.name) AS ii
            WHERE il.\"unique\" = 1 AND ii.name = 'email'
        )",
        [],
        |row| row.get(0),
    ).unwrap();
    assert!(email_unique, "accounts.email should carry a unique index");

    let redundant: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='index' AND name='idx_accounts_email')",
        [],
        |row| row.get(0),
    ).unwrap();
    assert!(!redundant, "No separate email index is created");
}

#[test]
fn test_initialize_is_idempotent() {
    let dir = tempdir().unwrap();
    let config = DatabaseConfig {
        path: dir.path().join("again.db").to_str().unwrap().to_string(),
        max_connections: 1,
    };

    drop(database::initialize(&config).unwrap());
    assert!(database::initialize(&config).is_ok());
}

#[test]
fn test_email_uniqueness_enforced() {
    let (_dir, pool) = setup_test_db();
    let conn = database::get_connection(&pool).unwrap();

    let first = Account::new("a@b.com".to_string(), "hash".to_string(), Role::Advertiser);
    let second = Account::new("a@b.com".to_string(), "hash".to_string(), Role::Owner);

    let insert = "INSERT INTO accounts (id, email, password_hash, role, created_at, updated_at)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

    conn.execute(insert, params![
        first.id, first.email, first.password_hash, first.role.as_str(),
        first.created_at.to_rfc3339(), first.updated_at.to_rfc3339(),
    ]).unwrap();

    let result = conn.execute(insert, params![
        second.id, second.email, second.password_hash, second.role.as_str(),
        second.created_at.to_rfc3339(), second.updated_at.to_rfc3339(),
    ]);

    assert!(result.is_err(), "Duplicate email must be rejected");
}

#[test]
fn test_audit_logs_are_append_only() {
    let (_dir, pool) = setup_test_db();
    let conn = database::get_connection(&pool).unwrap();

    let log = AuditLog::new(AuditEventType::LoginFailed, None, Some("unknown email".to_string()));
    conn.execute(
        "INSERT INTO audit_logs (id, event_type, account_id, details, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![log.id, log.event_type.as_str(), log.account_id, log.details, log.timestamp.to_rfc3339()],
    ).unwrap();

    assert!(conn.execute("UPDATE audit_logs SET details = 'x'", []).is_err());
    assert!(conn.execute("DELETE FROM audit_logs", []).is_err());
}

#[test]
fn test_role_round_trip() {
    for role in [Role::Advertiser, Role::Owner, Role::Admin] {
        assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
    }
    assert_eq!(Role::from_str(" ADMIN ").unwrap(), Role::Admin);
    assert!(Role::from_str("superuser").is_err());
    assert_eq!(Role::default(), Role::Advertiser);
}
