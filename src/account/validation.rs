use regex::Regex;
use std::sync::OnceLock;

use crate::account::EMAIL_REGEX;

/// Canonical form of an email: trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Credentials accepted by the sign-up and sign-in endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    /// Normalized email
    pub email: String,
    pub password: String,
}

/// Both fields must be present and non-empty. The password is taken verbatim.
pub fn require_credentials(email: Option<&str>, password: Option<&str>) -> Option<Credentials> {
    let email = normalize_email(email?);
    let password = password?;

    if email.is_empty() || password.is_empty() {
        return None;
    }

    Some(Credentials {
        email,
        password: password.to_string(),
    })
}

/// Loose shape check used for lead-capture submissions
pub fn is_valid_email(email: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_REGEX).expect("email pattern is a valid regex"))
        .is_match(email)
}
