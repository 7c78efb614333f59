//! Lead capture handlers
//!
//! - POST /api/email-signup - Newsletter / early-access sign-up
//! - POST /api/enquiry - Contact form submission
//!
//! Submissions are not persisted; they are written to the application log
//! for the sales team's log pipeline.

use actix_web::{web, HttpResponse};
use log::info;

use crate::account::{is_valid_email, normalize_email};
use crate::api::models::{EmailSignupRequest, EnquiryRequest, MessageResponse};
use crate::api::ApiError;

/// Normalized, shape-checked email from a lead form
fn lead_email(email: Option<&str>) -> Result<String, ApiError> {
    let email = normalize_email(email.unwrap_or_default());

    if email.is_empty() {
        return Err(ApiError::Validation("Email is required".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }

    Ok(email)
}

/// POST /api/email-signup
pub async fn email_signup_handler(
    body: web::Json<EmailSignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let email = lead_email(body.email.as_deref())?;

    info!("Email signup received: {}", email);

    Ok(HttpResponse::Ok().json(MessageResponse::new("Email signup successful")))
}

/// POST /api/enquiry
pub async fn enquiry_handler(body: web::Json<EnquiryRequest>) -> Result<HttpResponse, ApiError> {
    let email = lead_email(body.email.as_deref())?;
    let name = body.name.as_deref().map(str::trim).unwrap_or_default();
    let message = body.message.as_deref().map(str::trim).unwrap_or_default();

    info!(
        "Enquiry received from {} <{}> ({} chars)",
        if name.is_empty() { "anonymous" } else { name },
        email,
        message.chars().count()
    );

    Ok(HttpResponse::Ok().json(MessageResponse::new("Enquiry submitted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("Lead@Example.com ") => Some("lead@example.com".to_string()) ; "normalized")]
    #[test_case(None => None ; "missing")]
    #[test_case(Some("  ") => None ; "blank")]
    #[test_case(Some("not-an-email") => None ; "malformed")]
    fn test_lead_email(input: Option<&str>) -> Option<String> {
        lead_email(input).ok()
    }
}
