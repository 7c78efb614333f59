// HTTP API module
// actix-web handlers, the route guard middleware and the shared state they use.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use error::ApiError;
pub use middleware::RouteGuard;

use actix_web::{error::JsonPayloadError, web, HttpRequest};
use log::debug;
use std::sync::Arc;

use crate::account::{AuthService, SqliteAccountRepository};
use crate::config::{Config, SessionConfig};
use crate::database::DbPool;
use crate::security::{Argon2Hasher, CookieConfig, TokenIssuer};

/// Request bodies are small JSON documents
const MAX_JSON_BODY: usize = 16 * 1024;

/// State shared by every worker
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub cookies: CookieConfig,
    pub session: SessionConfig,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>, cookies: CookieConfig, session: SessionConfig) -> Self {
        Self {
            auth,
            cookies,
            session,
        }
    }

    /// Wire the SQLite repository, Argon2 hasher and token issuer from configuration
    pub fn from_config(config: &Config, pool: DbPool) -> Self {
        let repo = Arc::new(SqliteAccountRepository::new(pool));
        let hasher = Arc::new(Argon2Hasher::new(
            config.security.password_memory_kib,
            config.security.password_pepper.as_deref(),
        ));
        let tokens = TokenIssuer::from_config(&config.security);

        Self::new(
            Arc::new(AuthService::new(repo, hasher, tokens)),
            CookieConfig::from_config(config),
            config.session.clone(),
        )
    }

    /// Route guard bound to this state's session settings
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.auth.clone(), &self.session)
    }
}

/// JSON extractor settings: unreadable bodies are client errors
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY)
        .error_handler(json_error_handler)
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected body for {}: {}", req.path(), err);

    if req.path().starts_with("/api/auth/") {
        ApiError::MissingCredentials.into()
    } else {
        ApiError::Validation("Invalid request body".to_string()).into()
    }
}

/// Register every route of the API
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/signup", web::post().to(handlers::signup_handler))
            .route("/login", web::post().to(handlers::login_handler))
            .route("/logout", web::post().to(handlers::logout_handler))
            .route("/me", web::get().to(handlers::me_handler))
            .route("/status", web::get().to(handlers::status_handler)),
    )
    .route("/api/secure/session", web::get().to(handlers::session_handler))
    .route("/api/email-signup", web::post().to(handlers::email_signup_handler))
    .route("/api/enquiry", web::post().to(handlers::enquiry_handler));
}
