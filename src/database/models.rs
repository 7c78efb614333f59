use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Account role
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standard user buying screen time
    #[default]
    Advertiser,
    /// Venue / screen owner
    Owner,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Advertiser => "advertiser",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "advertiser" => Ok(Role::Advertiser),
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Account model
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Account {
    pub id: String,
    /// Always stored trimmed and lower-cased
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(email: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Audit event type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventType {
    AccountCreated,
    LoginSucceeded,
    LoginFailed,
    RoleChanged,
}

impl AuditEventType {
    pub fn as_str(&self) -> &str {
        match self {
            AuditEventType::AccountCreated => "account_created",
            AuditEventType::LoginSucceeded => "login_succeeded",
            AuditEventType::LoginFailed => "login_failed",
            AuditEventType::RoleChanged => "role_changed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "account_created" => Ok(AuditEventType::AccountCreated),
            "login_succeeded" => Ok(AuditEventType::LoginSucceeded),
            "login_failed" => Ok(AuditEventType::LoginFailed),
            "role_changed" => Ok(AuditEventType::RoleChanged),
            _ => Err(format!("Invalid audit event type: {}", s)),
        }
    }
}

/// Audit log entry
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditLog {
    pub id: String,
    pub event_type: AuditEventType,
    pub account_id: Option<String>,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        event_type: AuditEventType,
        account_id: Option<String>,
        details: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            account_id,
            details,
            timestamp: Utc::now(),
        }
    }
}
