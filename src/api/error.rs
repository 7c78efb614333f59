use actix_web::{
    error::BlockingError,
    http::StatusCode,
    HttpResponse, ResponseError,
};
use log::error;
use serde::Serialize;

use crate::account::AuthError;

/// Body of every error response: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors returned by HTTP handlers
///
/// Internal details are logged server-side and never sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing email or password")]
    MissingCredentials,

    #[error("{0}")]
    Validation(String),

    /// Deliberately identical for unknown account and wrong password
    #[error("Wrong ID or Password")]
    InvalidCredentials,

    #[error("User already exists")]
    Conflict,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::DuplicateEmail => ApiError::Conflict,
            AuthError::AccountNotFound | AuthError::Internal(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        ApiError::Internal(format!("Blocking task failed: {}", err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingCredentials | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(details) = self {
            error!("Request failed: {}", details);
        }

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.error_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_error_bodies() {
        let (status, body) = body_of(ApiError::MissingCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing email or password");

        let (status, body) = body_of(ApiError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Wrong ID or Password");

        let (status, body) = body_of(ApiError::Conflict).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "User already exists");
    }

    #[actix_web::test]
    async fn test_internal_details_not_leaked() {
        let (status, body) = body_of(ApiError::Internal("disk I/O error at /var/db".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(ApiError::from(AuthError::InvalidCredentials), ApiError::InvalidCredentials));
        assert!(matches!(ApiError::from(AuthError::DuplicateEmail), ApiError::Conflict));
        assert!(matches!(
            ApiError::from(AuthError::Internal("x".to_string())),
            ApiError::Internal(_)
        ));
    }
}
