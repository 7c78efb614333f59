use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::{Account, Role};

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    /// Account email
    pub email: String,
    /// Account role
    pub role: Role,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// JWT ID (unique identifier for this token)
    pub jti: String,
    /// Issuer
    pub iss: String,
}

impl Claims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Session token errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TokenError {
    #[error("Session token has expired")]
    Expired,

    #[error("Session token signature is invalid")]
    InvalidSignature,

    #[error("Session token is malformed: {0}")]
    Malformed(String),

    #[error("Failed to sign session token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Signs and verifies session tokens with a single HS256 secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
    issuer: String,
}

impl TokenIssuer {
    pub fn new(secret: &str, validity: Duration, issuer: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity,
            issuer: issuer.to_string(),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::minutes(config.token_validity),
            &config.token_issuer,
        )
    }

    /// How long issued tokens stay valid
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a session token for an account, valid from now
    pub fn issue(&self, account: &Account) -> Result<(String, Claims), TokenError> {
        self.issue_at(account, Utc::now())
    }

    /// Issue a session token as if signed at `issued_at`
    pub fn issue_at(
        &self,
        account: &Account,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, Claims), TokenError> {
        let claims = Claims {
            sub: account.id.clone(),
            email: account.email.clone(),
            role: account.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.validity).timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        debug!("Issued session token {} for account {}", claims.jti, claims.sub);
        Ok((token, claims))
    }

    /// Verify signature, issuer and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", Duration::hours(2), "sabjaano")
    }

    fn account() -> Account {
        Account::new("a@b.com".to_string(), "hash".to_string(), Role::Owner)
    }

    #[test]
    fn test_token_generation_and_validation() {
        let issuer = issuer();
        let account = account();

        let (token, issued) = issuer.issue(&account).unwrap();
        let claims = issuer.validate(&token).unwrap();

        assert_eq!(claims, issued);
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, Role::Owner);
        assert_eq!(claims.exp - claims.iat, 2 * 60 * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer();
        let issued_at = Utc::now() - Duration::hours(2) - Duration::seconds(5);

        let (token, _) = issuer.issue_at(&account(), issued_at).unwrap();
        assert_eq!(issuer.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_token_just_inside_window_accepted() {
        let issuer = issuer();
        let issued_at = Utc::now() - Duration::hours(2) + Duration::minutes(1);

        let (token, _) = issuer.issue_at(&account(), issued_at).unwrap();
        assert!(issuer.validate(&token).is_ok());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let other = TokenIssuer::new("another-secret", Duration::hours(2), "sabjaano");
        let (token, _) = other.issue(&account()).unwrap();

        assert_eq!(issuer().validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let other = TokenIssuer::new("test-secret", Duration::hours(2), "someone-else");
        let (token, _) = other.issue(&account()).unwrap();

        assert!(matches!(issuer().validate(&token), Err(TokenError::Malformed(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(issuer().validate("not.a.jwt"), Err(TokenError::Malformed(_))));
        assert!(issuer().validate("").is_err());
    }
}
