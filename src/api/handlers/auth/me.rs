use actix_web::{web, HttpRequest, HttpResponse};

use super::session_token;
use crate::api::models::MeResponse;
use crate::api::AppState;

/// GET /api/auth/me
pub async fn me_handler(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let token = session_token(&req, &state);

    match state.auth.session(token.as_deref()) {
        Some(_) => HttpResponse::Ok().json(MeResponse { auth: true }),
        None => HttpResponse::Unauthorized().json(MeResponse { auth: false }),
    }
}
