use actix_web::{web, HttpRequest, HttpResponse};

use super::session_token;
use crate::api::models::StatusResponse;
use crate::api::AppState;

/// GET /api/auth/status
///
/// Never fails; a missing, forged or expired cookie reads as `false`.
pub async fn status_handler(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let token = session_token(&req, &state);
    let authenticated = state.auth.session(token.as_deref()).is_some();

    HttpResponse::Ok().json(StatusResponse { authenticated })
}
