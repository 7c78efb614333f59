// Account management module
// Registration, credential verification and session checks over a
// pluggable account store.

pub mod repository;
pub mod service;
pub mod validation;

pub use repository::{AccountRepository, RepositoryError, SqliteAccountRepository};
pub use service::{AuthError, AuthService, Session};
pub use validation::{is_valid_email, normalize_email, require_credentials, Credentials};

/// Email regex pattern for validation
pub const EMAIL_REGEX: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";
