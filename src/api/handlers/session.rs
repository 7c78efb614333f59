//! GET /api/secure/session - Details of the caller's session
//!
//! Mounted under a protected prefix, so the route guard has already
//! validated the cookie and attached the claims.

use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use chrono::SecondsFormat;

use crate::api::models::SessionInfo;
use crate::api::ApiError;
use crate::security::Claims;

pub async fn session_handler(req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or(ApiError::Unauthorized)?;

    Ok(HttpResponse::Ok().json(SessionInfo {
        expires_at: claims
            .expires_at()
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default(),
        id: claims.sub,
        email: claims.email,
        role: claims.role,
    }))
}
