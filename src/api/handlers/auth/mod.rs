//! Authentication handlers
//!
//! The session JWT only ever travels in an HttpOnly cookie.
//!
//! ## Endpoints
//! - POST /api/auth/signup - Create an account
//! - POST /api/auth/login - Verify credentials and set the session cookie
//! - POST /api/auth/logout - Clear the session cookie
//! - GET /api/auth/me - Whether the session cookie is present and valid
//! - GET /api/auth/status - Same check, reported as a 200 with a boolean

mod login;
mod logout;
mod me;
mod signup;
mod status;

pub use login::login_handler;
pub use logout::logout_handler;
pub use me::me_handler;
pub use signup::signup_handler;
pub use status::status_handler;

use actix_web::HttpRequest;

use crate::api::AppState;

/// Raw value of the session cookie, if the request carries one
pub(crate) fn session_token(req: &HttpRequest, state: &AppState) -> Option<String> {
    req.cookie(&state.cookies.name).map(|c| c.value().to_string())
}
