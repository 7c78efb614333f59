use log::{debug, error, info, warn};
use std::sync::{Arc, OnceLock};

use crate::account::repository::{AccountRepository, RepositoryError};
use crate::account::validation::{normalize_email, Credentials};
use crate::database::models::{Account, AuditEventType, Role};
use crate::security::{Claims, CredentialHasher, TokenIssuer};

/// Account and session errors, as the HTTP layer sees them
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password; the two are never distinguished
    #[error("Wrong ID or Password")]
    InvalidCredentials,

    #[error("User already exists")]
    DuplicateEmail,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AuthError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DuplicateEmail => AuthError::DuplicateEmail,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: Claims,
}

/// Password verified against when the email is unknown
const DUMMY_PASSWORD: &str = "sabjaano-dummy-password";

/// Registration, credential verification and session checks
pub struct AuthService {
    repo: Arc<dyn AccountRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenIssuer,
    // Hashed on first use with the live hasher parameters
    dummy_hash: OnceLock<Option<String>>,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            repo,
            hasher,
            tokens,
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create a standard account
    pub fn register(&self, credentials: &Credentials) -> Result<Account, AuthError> {
        self.register_with_role(credentials, Role::default())
    }

    /// Create an account with an explicit role
    pub fn register_with_role(
        &self,
        credentials: &Credentials,
        role: Role,
    ) -> Result<Account, AuthError> {
        debug!("Registering account for {}", credentials.email);

        if self.repo.find_by_email(&credentials.email)?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = self
            .hasher
            .hash_password(&credentials.password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let account = Account::new(credentials.email.clone(), password_hash, role);

        // A concurrent sign-up can still win the race; the UNIQUE constraint reports it
        self.repo.insert(&account)?;

        self.repo.record_event(
            AuditEventType::AccountCreated,
            Some(account.id.clone()),
            &format!("Account created with role {}", account.role.as_str()),
        );

        info!("Account registered: {}", account.id);
        Ok(account)
    }

    /// Verify credentials and issue a session token
    pub fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let account = match self.repo.find_by_email(&credentials.email)? {
            Some(account) => account,
            None => {
                // Unknown emails pay the same Argon2 cost as wrong passwords
                self.verify_against_dummy(&credentials.password);
                self.repo.record_event(AuditEventType::LoginFailed, None, "Unknown account");
                debug!("Login rejected: no account for the given email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let valid = match self.hasher.verify_password(&credentials.password, &account.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                error!("Password verification failed for account {}: {}", account.id, e);
                return Err(AuthError::Internal(e.to_string()));
            }
        };

        if !valid {
            self.repo.record_event(
                AuditEventType::LoginFailed,
                Some(account.id.clone()),
                "Wrong password",
            );
            warn!("Login rejected: wrong password for account {}", account.id);
            return Err(AuthError::InvalidCredentials);
        }

        let (token, claims) = self
            .tokens
            .issue(&account)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.repo.record_event(
            AuditEventType::LoginSucceeded,
            Some(account.id.clone()),
            &format!("Session {} issued", claims.jti),
        );

        info!("Account {} signed in", account.id);
        Ok(Session { token, claims })
    }

    fn verify_against_dummy(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_init(|| match self.hasher.hash_password(DUMMY_PASSWORD) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    error!("Failed to prepare dummy password hash: {}", e);
                    None
                }
            });

        if let Some(hash) = dummy {
            let _ = self.hasher.verify_password(password, hash);
        }
    }

    /// Claims of a valid session token. Any failure means "not authenticated".
    pub fn session(&self, token: Option<&str>) -> Option<Claims> {
        let token = token.filter(|t| !t.is_empty())?;

        match self.tokens.validate(token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                debug!("Session token rejected: {}", e);
                None
            }
        }
    }

    /// Change the role of the account registered under `email`
    pub fn set_role(&self, email: &str, role: Role) -> Result<Account, AuthError> {
        let email = normalize_email(email);
        let mut account = self
            .repo
            .find_by_email(&email)?
            .ok_or(AuthError::AccountNotFound)?;

        if !self.repo.update_role(&account.id, role)? {
            return Err(AuthError::AccountNotFound);
        }

        self.repo.record_event(
            AuditEventType::RoleChanged,
            Some(account.id.clone()),
            &format!("Role changed from {} to {}", account.role.as_str(), role.as_str()),
        );

        account.role = role;
        Ok(account)
    }
}
