//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

use crate::database::models::Role;

/// Body of `POST /api/auth/signup` and `POST /api/auth/login`
///
/// Fields are optional so a missing key is reported as a validation error
/// instead of a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// Body of `GET /api/auth/me`
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub auth: bool,
}

/// Body of `GET /api/auth/status`
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub authenticated: bool,
}

/// Body of `GET /api/secure/session`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub expires_at: String,
}

/// Body of `POST /api/email-signup`
#[derive(Debug, Default, Deserialize)]
pub struct EmailSignupRequest {
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `POST /api/enquiry`
#[derive(Debug, Default, Deserialize)]
pub struct EnquiryRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
