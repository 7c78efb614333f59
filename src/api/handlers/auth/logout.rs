//! Logout handler
//!
//! POST /api/auth/logout - Clears the session cookie

use actix_web::{web, HttpResponse};

use crate::api::models::LogoutResponse;
use crate::api::AppState;
use crate::security::create_logout_cookie;

/// POST /api/auth/logout
///
/// Always succeeds, with or without a session.
pub async fn logout_handler(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(create_logout_cookie(&state.cookies))
        .json(LogoutResponse { logged_out: true })
}
