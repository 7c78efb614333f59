use serde::Deserialize;

/// What went wrong when talking to the OTP service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpErrorKind {
    InvalidCode,
    Expired,
    TooManyAttempts,
    UserNotFound,
    IdentifierRequired,
    /// The service does not expose the requested route (HTTP 404 without a code)
    EndpointMissing,
    /// No usable HTTP response: connection, timeout or unreadable body
    Transport,
    Other,
}

impl OtpErrorKind {
    /// Map the service's machine-readable error code
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().replace('-', "_").as_str() {
            "invalid_otp" | "otp_invalid" | "invalid_code" => Some(OtpErrorKind::InvalidCode),
            "otp_expired" | "expired" | "code_expired" => Some(OtpErrorKind::Expired),
            "too_many_attempts" | "rate_limited" | "too_many_requests" => {
                Some(OtpErrorKind::TooManyAttempts)
            }
            "user_not_found" => Some(OtpErrorKind::UserNotFound),
            "identifier_required" | "email_or_phone_required" => {
                Some(OtpErrorKind::IdentifierRequired)
            }
            _ => None,
        }
    }

    /// Fallback classification when the body carries no recognised code
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => OtpErrorKind::EndpointMissing,
            410 => OtpErrorKind::Expired,
            429 => OtpErrorKind::TooManyAttempts,
            _ => OtpErrorKind::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OtpErrorKind::InvalidCode => "invalid_code",
            OtpErrorKind::Expired => "expired",
            OtpErrorKind::TooManyAttempts => "too_many_attempts",
            OtpErrorKind::UserNotFound => "user_not_found",
            OtpErrorKind::IdentifierRequired => "identifier_required",
            OtpErrorKind::EndpointMissing => "endpoint_missing",
            OtpErrorKind::Transport => "transport",
            OtpErrorKind::Other => "other",
        }
    }
}

/// Error body returned by the OTP service
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A failed call to the OTP service
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}", .kind.as_str())]
pub struct OtpError {
    pub kind: OtpErrorKind,
    /// Message from the service, if it sent one
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
}

impl OtpError {
    pub fn new(kind: OtpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Classify a non-success response from its status and raw body
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

        let kind = parsed
            .code
            .as_deref()
            .and_then(OtpErrorKind::from_code)
            .unwrap_or_else(|| OtpErrorKind::from_status(status));

        let message = parsed
            .message
            .or(parsed.error)
            .unwrap_or_else(|| body.trim().chars().take(200).collect());

        Self {
            kind,
            message,
            status: Some(status),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(OtpErrorKind::Transport, message)
    }

    /// Text suitable for showing to the person signing in
    pub fn user_message(&self) -> String {
        let fixed = match self.kind {
            OtpErrorKind::InvalidCode => "That code didn't work. Please try again.",
            OtpErrorKind::Expired => "Code expired. Please request a new one.",
            OtpErrorKind::TooManyAttempts => "Too many attempts. Please wait and retry.",
            OtpErrorKind::UserNotFound => "No account found for this identifier.",
            OtpErrorKind::IdentifierRequired => "Please enter your email or phone.",
            OtpErrorKind::Transport => "Could not reach the server. Please check your connection.",
            OtpErrorKind::EndpointMissing | OtpErrorKind::Other => {
                if self.message.trim().is_empty() {
                    "Something went wrong. Please try again."
                } else {
                    return self.message.clone();
                }
            }
        };
        fixed.to_string()
    }
}

impl From<reqwest::Error> for OtpError {
    fn from(err: reqwest::Error) -> Self {
        OtpError::transport(err.to_string())
    }
}
