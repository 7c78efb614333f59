// Session cookie handling
//
// The session token travels only in an HttpOnly cookie; there is no
// server-side session table, so clearing the cookie ends the session.

use actix_web::cookie::{time, Cookie, SameSite};
use chrono::Duration;

use crate::config::Config;

/// Attributes shared by every session cookie the server sets
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Cookie name (`token` by default)
    pub name: String,
    /// Whether to set the Secure flag (production only)
    pub secure: bool,
    /// Cookie path
    pub path: String,
    pub same_site: SameSite,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "token".to_string(),
            secure: false,
            path: "/".to_string(),
            same_site: SameSite::Lax,
        }
    }
}

impl CookieConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.session.cookie_name.clone(),
            secure: config.environment.is_production(),
            ..Default::default()
        }
    }
}

/// Build the HttpOnly cookie carrying a freshly issued session token
pub fn create_session_cookie(
    token: &str,
    max_age: Duration,
    config: &CookieConfig,
) -> Cookie<'static> {
    Cookie::build(config.name.clone(), token.to_string())
        .path(config.path.clone())
        .http_only(true)
        .secure(config.secure)
        .same_site(config.same_site)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .finish()
}

/// Build a cookie that makes the browser drop the session cookie
pub fn create_logout_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build(config.name.clone(), "")
        .path(config.path.clone())
        .http_only(true)
        .secure(config.secure)
        .same_site(config.same_site)
        .max_age(time::Duration::ZERO)
        .finish()
}
