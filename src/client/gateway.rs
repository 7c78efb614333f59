//! Access to the external identity / OTP service.
//!
//! [`OtpGateway`] is the seam the sign-in flows depend on;
//! [`HttpOtpGateway`] implements it over HTTP with `reqwest`. The client
//! keeps a cookie store so a session cookie set by the service is sent on
//! later calls, the same way a browser would.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::client::error::OtpError;
use crate::client::identifier::Identifier;
use crate::config::OtpConfig;

/// Token container nested under `data`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Successful reply from the authentication routes
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthReply {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub data: Option<TokenData>,
    #[serde(default)]
    pub message: Option<String>,
    /// Reported by `login-init`; `Some(false)` means no code was sent
    #[serde(default)]
    pub otp_required: Option<bool>,
}

impl AuthReply {
    /// Access token wherever the service put it
    pub fn token(&self) -> Option<&str> {
        let nested = self.data.as_ref();
        self.access_token
            .as_deref()
            .or(self.token.as_deref())
            .or_else(|| nested.and_then(|d| d.access_token.as_deref()))
            .or_else(|| nested.and_then(|d| d.token.as_deref()))
            .filter(|t| !t.is_empty())
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            access_token: Some(token.to_string()),
            ..Default::default()
        }
    }
}

/// Operations the OTP flows need from the identity service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpGateway: Send + Sync {
    /// Verify a password and trigger an OTP (`POST auth/login-init`)
    async fn login_init(&self, email: &str, password: &str) -> Result<AuthReply, OtpError>;

    /// Plain password login (`POST auth/login`)
    async fn login(&self, email: &str, password: &str) -> Result<AuthReply, OtpError>;

    /// Create an account (`POST auth/register`)
    async fn register(&self, email: &str, password: &str) -> Result<(), OtpError>;

    /// `POST auth/send-otp`
    async fn send_otp(&self, identifier: &Identifier) -> Result<(), OtpError>;

    /// `POST auth/re-send-otp`
    async fn resend_otp(&self, identifier: &Identifier) -> Result<(), OtpError>;

    /// `POST auth/verify-otp`
    async fn verify_otp(&self, identifier: &Identifier, code: &str) -> Result<AuthReply, OtpError>;

    /// Whether an account exists for the identifier (`GET auth/check-user-status`)
    async fn user_exists(&self, identifier: &Identifier) -> Result<bool, OtpError>;
}

#[derive(Serialize)]
struct PasswordBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    #[serde(flatten)]
    identifier: &'a Identifier,
    otp: &'a str,
}

/// [`OtpGateway`] backed by the service's HTTP API
#[derive(Clone)]
pub struct HttpOtpGateway {
    client: Client,
    base_url: String,
}

impl HttpOtpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, OtpError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &OtpConfig) -> Result<Self, OtpError> {
        Self::new(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn url(&self, route: &str) -> String {
        format!("{}/auth/{}", self.base_url, route)
    }

    async fn post<B, R>(&self, route: &str, body: &B) -> Result<R, OtpError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned + Default,
    {
        debug!("POST auth/{}", route);
        let response = self.client.post(self.url(route)).json(body).send().await?;
        read_reply(route, response).await
    }
}

/// Decode a reply; an empty success body decodes to the default value
async fn read_reply<R>(route: &str, response: Response) -> Result<R, OtpError>
where
    R: DeserializeOwned + Default,
{
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let err = OtpError::from_response(status.as_u16(), &text);
        debug!("auth/{} failed: {}", route, err);
        return Err(err);
    }

    if text.trim().is_empty() {
        return Ok(R::default());
    }

    serde_json::from_str(&text)
        .map_err(|e| OtpError::transport(format!("Unreadable reply from auth/{}: {}", route, e)))
}

#[async_trait]
impl OtpGateway for HttpOtpGateway {
    async fn login_init(&self, email: &str, password: &str) -> Result<AuthReply, OtpError> {
        self.post("login-init", &PasswordBody { email, password }).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthReply, OtpError> {
        self.post("login", &PasswordBody { email, password }).await
    }

    async fn register(&self, email: &str, password: &str) -> Result<(), OtpError> {
        let _: serde_json::Value = self.post("register", &PasswordBody { email, password }).await?;
        Ok(())
    }

    async fn send_otp(&self, identifier: &Identifier) -> Result<(), OtpError> {
        let _: serde_json::Value = self.post("send-otp", identifier).await?;
        Ok(())
    }

    async fn resend_otp(&self, identifier: &Identifier) -> Result<(), OtpError> {
        let _: serde_json::Value = self.post("re-send-otp", identifier).await?;
        Ok(())
    }

    async fn verify_otp(&self, identifier: &Identifier, code: &str) -> Result<AuthReply, OtpError> {
        self.post("verify-otp", &VerifyBody { identifier, otp: code }).await
    }

    /// Unreachable service counts as "exists" so the user can still try
    /// to receive a code.
    async fn user_exists(&self, identifier: &Identifier) -> Result<bool, OtpError> {
        let response = self
            .client
            .get(self.url("check-user-status"))
            .query(&[(identifier.field_name(), identifier.value())])
            .send()
            .await;

        match response {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                warn!("User status check failed, assuming the account exists: {}", e);
                Ok(true)
            }
        }
    }
}
