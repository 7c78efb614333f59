//! Signup handler
//!
//! POST /api/auth/signup - Creates an account with the default role

use actix_web::{web, HttpResponse};

use crate::account::require_credentials;
use crate::api::models::{CredentialsRequest, SignupResponse};
use crate::api::{ApiError, AppState};

/// POST /api/auth/signup
///
/// 201 with `{id, email}`, 400 when a field is missing, 409 when the email
/// is already registered.
pub async fn signup_handler(
    state: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, ApiError> {
    let credentials = require_credentials(body.email.as_deref(), body.password.as_deref())
        .ok_or(ApiError::MissingCredentials)?;

    let auth = state.auth.clone();
    let account = web::block(move || auth.register(&credentials)).await??;

    Ok(HttpResponse::Created().json(SignupResponse {
        id: account.id,
        email: account.email,
    }))
}
