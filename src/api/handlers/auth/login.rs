//! Login handler
//!
//! POST /api/auth/login - Verifies credentials and sets the session cookie

use actix_web::{web, HttpResponse};

use crate::account::require_credentials;
use crate::api::models::{CredentialsRequest, MessageResponse};
use crate::api::{ApiError, AppState};
use crate::security::create_session_cookie;

/// POST /api/auth/login
///
/// Unknown email and wrong password produce the same 401 body.
pub async fn login_handler(
    state: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, ApiError> {
    let credentials = require_credentials(body.email.as_deref(), body.password.as_deref())
        .ok_or(ApiError::MissingCredentials)?;

    let auth = state.auth.clone();
    let session = web::block(move || auth.login(&credentials)).await??;

    let cookie = create_session_cookie(
        &session.token,
        state.auth.tokens().validity(),
        &state.cookies,
    );

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(MessageResponse::new("Logged in")))
}
