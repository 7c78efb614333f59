//! Credential primitives: password hashing, session tokens and the cookie
//! that carries them.

pub mod cookie;
pub mod jwt;
pub mod password;

pub use cookie::{create_logout_cookie, create_session_cookie, CookieConfig};
pub use jwt::{Claims, TokenError, TokenIssuer};
pub use password::{Argon2Hasher, CredentialHasher, PasswordError};
