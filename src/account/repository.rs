use chrono::{DateTime, Utc};
use log::{debug, error};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::audit;
use crate::database::models::{Account, AuditEventType, Role};
use crate::database::{self, DbPool};

/// Account persistence errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("Failed to get a database connection: {0}")]
    Connection(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == ErrorCode::ConstraintViolation
                    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                RepositoryError::DuplicateEmail
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

/// Storage for accounts and their audit trail
#[cfg_attr(test, mockall::automock)]
pub trait AccountRepository: Send + Sync {
    /// Look up an account by its already-normalized email
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError>;

    fn find_by_id(&self, id: &str) -> Result<Option<Account>, RepositoryError>;

    /// Insert a new account. Fails with `DuplicateEmail` on a taken email.
    fn insert(&self, account: &Account) -> Result<(), RepositoryError>;

    /// Change an account's role. Returns false if no such account exists.
    fn update_role(&self, id: &str, role: Role) -> Result<bool, RepositoryError>;

    /// Append an audit event; never fails the caller
    fn record_event(&self, event: AuditEventType, account_id: Option<String>, details: &str);
}

/// SQLite-backed account repository
pub struct SqliteAccountRepository {
    pool: DbPool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn connection(&self) -> Result<database::DbConnection, RepositoryError> {
        database::get_connection(&self.pool).map_err(|e| RepositoryError::Connection(e.to_string()))
    }

    fn find_one(
        &self,
        conn: &Connection,
        column: &str,
        value: &str,
    ) -> Result<Option<Account>, RepositoryError> {
        let sql = format!(
            "SELECT id, email, password_hash, role, created_at, updated_at
             FROM accounts WHERE {} = ?1",
            column
        );

        let account = conn
            .query_row(&sql, params![value], account_from_row)
            .optional()?;

        Ok(account)
    }
}

impl AccountRepository for SqliteAccountRepository {
    fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let conn = self.connection()?;
        self.find_one(&conn, "email", email)
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Account>, RepositoryError> {
        let conn = self.connection()?;
        self.find_one(&conn, "id", id)
    }

    fn insert(&self, account: &Account) -> Result<(), RepositoryError> {
        let conn = self.connection()?;

        conn.execute(
            "INSERT INTO accounts (id, email, password_hash, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                account.id,
                account.email,
                account.password_hash,
                account.role.as_str(),
                account.created_at.to_rfc3339(),
                account.updated_at.to_rfc3339(),
            ],
        )?;

        debug!("Stored account {}", account.id);
        Ok(())
    }

    fn update_role(&self, id: &str, role: Role) -> Result<bool, RepositoryError> {
        let conn = self.connection()?;

        let changed = conn.execute(
            "UPDATE accounts SET role = ?1, updated_at = ?2 WHERE id = ?3",
            params![role.as_str(), Utc::now().to_rfc3339(), id],
        )?;

        Ok(changed > 0)
    }

    fn record_event(&self, event: AuditEventType, account_id: Option<String>, details: &str) {
        match self.connection() {
            Ok(conn) => audit::record(&conn, event, account_id.as_deref(), Some(details)),
            Err(e) => error!("Audit event {} dropped: {}", event.as_str(), e),
        }
    }
}

fn parse_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let role_str: String = row.get(3)?;
    let role = Role::from_str(&role_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
    })?;

    Ok(Account {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        role,
        created_at: parse_timestamp(4, row.get(4)?)?,
        updated_at: parse_timestamp(5, row.get(5)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct TestStore {
        _dir: TempDir,
        pool: DbPool,
        repo: SqliteAccountRepository,
    }

    #[fixture]
    fn store() -> TestStore {
        let dir = TempDir::new().unwrap();
        let pool = database::initialize(&DatabaseConfig {
            path: dir.path().join("accounts.db").to_str().unwrap().to_string(),
            max_connections: 2,
        })
        .unwrap();

        TestStore {
            _dir: dir,
            repo: SqliteAccountRepository::new(pool.clone()),
            pool,
        }
    }

    #[rstest]
    fn test_insert_and_find(store: TestStore) {
        let account = Account::new("a@b.com".to_string(), "$argon2id$hash".to_string(), Role::Advertiser);
        store.repo.insert(&account).unwrap();

        let by_email = store.repo.find_by_email("a@b.com").unwrap().unwrap();
        assert_eq!(by_email.id, account.id);
        assert_eq!(by_email.role, Role::Advertiser);
        assert_eq!(by_email.password_hash, "$argon2id$hash");
        assert_eq!(by_email.created_at.timestamp(), account.created_at.timestamp());

        let by_id = store.repo.find_by_id(&account.id).unwrap().unwrap();
        assert_eq!(by_id.email, "a@b.com");

        assert!(store.repo.find_by_email("nobody@b.com").unwrap().is_none());
    }

    #[rstest]
    fn test_duplicate_email_maps_to_conflict(store: TestStore) {
        let first = Account::new("a@b.com".to_string(), "h1".to_string(), Role::Advertiser);
        let second = Account::new("a@b.com".to_string(), "h2".to_string(), Role::Advertiser);

        store.repo.insert(&first).unwrap();
        assert!(matches!(store.repo.insert(&second), Err(RepositoryError::DuplicateEmail)));
    }

    #[rstest]
    fn test_update_role(store: TestStore) {
        let account = Account::new("owner@b.com".to_string(), "h".to_string(), Role::Advertiser);
        store.repo.insert(&account).unwrap();

        assert!(store.repo.update_role(&account.id, Role::Owner).unwrap());
        assert_eq!(store.repo.find_by_id(&account.id).unwrap().unwrap().role, Role::Owner);

        assert!(!store.repo.update_role("missing", Role::Admin).unwrap());
    }

    #[rstest]
    fn test_record_event(store: TestStore) {
        store.repo.record_event(AuditEventType::LoginFailed, None, "unknown account");

        let conn = database::get_connection(&store.pool).unwrap();
        let events = audit::recent_events(&conn, 5).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details.as_deref(), Some("unknown account"));
    }
}
