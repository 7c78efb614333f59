//! One-time-code sign-in and sign-up state machines.
//!
//! Sign-in: `PasswordEntry -> OtpPending -> Verified`
//! Sign-up: `RegistrationForm -> OtpPending -> Verified`
//!
//! Resend cooldowns are computed from an injected [`Clock`]; no timers run
//! in the background, so dropping a flow leaves nothing behind.

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::account::normalize_email;
use crate::client::clock::Clock;
use crate::client::error::{OtpError, OtpErrorKind};
use crate::client::gateway::OtpGateway;
use crate::client::identifier::Identifier;
use crate::config::OtpConfig;

/// Limits applied to every challenge
#[derive(Debug, Clone)]
pub struct OtpPolicy {
    pub max_attempts: u32,
    pub resend_cooldown: Duration,
    pub code_length: usize,
    /// Pause before the single retry of a failed post-registration send
    pub send_retry_delay: std::time::Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            resend_cooldown: Duration::seconds(30),
            code_length: 6,
            send_retry_delay: std::time::Duration::from_millis(600),
        }
    }
}

impl OtpPolicy {
    pub fn from_config(config: &OtpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            resend_cooldown: Duration::seconds(config.resend_cooldown_secs),
            code_length: config.code_length,
            ..Default::default()
        }
    }
}

/// A code has been sent and is waiting to be entered
#[derive(Debug, Clone, PartialEq)]
pub struct OtpChallenge {
    identifier: Identifier,
    attempts: u32,
    resend_available_at: DateTime<Utc>,
}

impl OtpChallenge {
    fn new(identifier: Identifier, now: DateTime<Utc>, policy: &OtpPolicy) -> Self {
        Self {
            identifier,
            attempts: 0,
            resend_available_at: now + policy.resend_cooldown,
        }
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Failed verifications so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whole seconds until a resend is allowed, rounded up
    pub fn resend_in(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.resend_available_at - now).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            (millis + 999) / 1000
        }
    }
}

/// Outcome of a completed flow
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedSession {
    pub identifier: Identifier,
    /// Token returned by the service, when it returns one in the body
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignInState {
    PasswordEntry,
    OtpPending(OtpChallenge),
    Verified(VerifiedSession),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpState {
    RegistrationForm,
    OtpPending(OtpChallenge),
    Verified(VerifiedSession),
}

/// Whether the code was delivered after registration
#[derive(Debug, Clone, PartialEq)]
pub enum OtpDelivery {
    Sent,
    /// Both attempts failed; the user can resend once the cooldown expires
    Failed(OtpError),
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Enter your email and password.")]
    MissingCredentials,

    #[error("Enter the {0}-digit code.")]
    InvalidCodeFormat(usize),

    #[error("You can request a new code in {remaining}s.")]
    ResendCooldown { remaining: i64 },

    #[error("Too many attempts. Please wait and retry.")]
    AttemptsExhausted,

    #[error("No code is pending verification.")]
    NotAwaitingCode,

    #[error("This step has already been completed.")]
    WrongStep,

    #[error("{}", .0.user_message())]
    Service(#[from] OtpError),
}

impl FlowError {
    /// Service error kind, when the failure came from the service
    pub fn kind(&self) -> Option<OtpErrorKind> {
        match self {
            FlowError::Service(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Invoked once when a flow reaches `Verified`
pub type AuthCallback = Box<dyn Fn(&VerifiedSession) + Send + Sync>;

fn check_code<'a>(
    policy: &OtpPolicy,
    challenge: &OtpChallenge,
    code: &'a str,
) -> Result<&'a str, FlowError> {
    if challenge.attempts >= policy.max_attempts {
        return Err(FlowError::AttemptsExhausted);
    }

    let code = code.trim();
    if code.len() != policy.code_length || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(FlowError::InvalidCodeFormat(policy.code_length));
    }

    Ok(code)
}

async fn resend_code(
    gateway: &dyn OtpGateway,
    clock: &dyn Clock,
    policy: &OtpPolicy,
    challenge: &mut OtpChallenge,
) -> Result<(), FlowError> {
    let remaining = challenge.resend_in(clock.now());
    if remaining > 0 {
        return Err(FlowError::ResendCooldown { remaining });
    }

    gateway.resend_otp(&challenge.identifier).await?;
    challenge.resend_available_at = clock.now() + policy.resend_cooldown;
    debug!("Code re-sent to {}", challenge.identifier.masked());
    Ok(())
}

fn notify(callback: &Option<AuthCallback>, session: &VerifiedSession) {
    if let Some(callback) = callback {
        callback(session);
    }
}

/// Password-then-code sign-in, or code-only sign-in
pub struct SignInFlow {
    gateway: Arc<dyn OtpGateway>,
    clock: Arc<dyn Clock>,
    policy: OtpPolicy,
    state: SignInState,
    on_authenticated: Option<AuthCallback>,
}

impl SignInFlow {
    pub fn new(gateway: Arc<dyn OtpGateway>, clock: Arc<dyn Clock>, policy: OtpPolicy) -> Self {
        Self {
            gateway,
            clock,
            policy,
            state: SignInState::PasswordEntry,
            on_authenticated: None,
        }
    }

    pub fn on_authenticated(mut self, callback: AuthCallback) -> Self {
        self.on_authenticated = Some(callback);
        self
    }

    pub fn state(&self) -> &SignInState {
        &self.state
    }

    pub fn challenge(&self) -> Option<&OtpChallenge> {
        match &self.state {
            SignInState::OtpPending(challenge) => Some(challenge),
            _ => None,
        }
    }

    /// Verify the password and have a code sent to the account's email
    ///
    /// A code is always required: if the service says none is needed, one
    /// is requested anyway. A service without `login-init` gets a plain
    /// password check followed by an explicit send.
    pub async fn submit_password(&mut self, email: &str, password: &str) -> Result<(), FlowError> {
        if self.state != SignInState::PasswordEntry {
            return Err(FlowError::WrongStep);
        }

        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(FlowError::MissingCredentials);
        }
        let identifier = Identifier::Email(email);

        match self.gateway.login_init(identifier.value(), password).await {
            Ok(reply) => {
                if reply.otp_required == Some(false) {
                    debug!("Service did not send a code; requesting one");
                    self.gateway.send_otp(&identifier).await?;
                }
            }
            Err(e) if e.kind == OtpErrorKind::EndpointMissing => {
                debug!("login-init unavailable, falling back to password login");
                self.gateway.login(identifier.value(), password).await?;
                self.gateway.send_otp(&identifier).await?;
            }
            Err(e) => return Err(e.into()),
        }

        self.state = SignInState::OtpPending(OtpChallenge::new(
            identifier,
            self.clock.now(),
            &self.policy,
        ));
        Ok(())
    }

    /// Code-only sign-in for an email or phone number
    pub async fn request_code(&mut self, raw_identifier: &str) -> Result<(), FlowError> {
        if self.state != SignInState::PasswordEntry {
            return Err(FlowError::WrongStep);
        }

        let identifier = Identifier::parse(raw_identifier).ok_or_else(|| {
            OtpError::new(OtpErrorKind::IdentifierRequired, "Email or phone required")
        })?;

        if !self.gateway.user_exists(&identifier).await? {
            return Err(OtpError::new(OtpErrorKind::UserNotFound, "User not found").into());
        }

        self.gateway.send_otp(&identifier).await?;

        self.state = SignInState::OtpPending(OtpChallenge::new(
            identifier,
            self.clock.now(),
            &self.policy,
        ));
        Ok(())
    }

    pub async fn resend(&mut self) -> Result<(), FlowError> {
        let SignInState::OtpPending(challenge) = &mut self.state else {
            return Err(FlowError::NotAwaitingCode);
        };

        resend_code(
            self.gateway.as_ref(),
            self.clock.as_ref(),
            &self.policy,
            challenge,
        )
        .await
    }

    pub async fn verify(&mut self, code: &str) -> Result<VerifiedSession, FlowError> {
        let SignInState::OtpPending(challenge) = &mut self.state else {
            return Err(FlowError::NotAwaitingCode);
        };

        let code = check_code(&self.policy, challenge, code)?;

        match self.gateway.verify_otp(&challenge.identifier, code).await {
            Ok(reply) => {
                let session = VerifiedSession {
                    identifier: challenge.identifier.clone(),
                    access_token: reply.token().map(String::from),
                };
                info!("Sign-in verified for {}", session.identifier.masked());
                notify(&self.on_authenticated, &session);
                self.state = SignInState::Verified(session.clone());
                Ok(session)
            }
            Err(e) => {
                challenge.attempts += 1;
                warn!(
                    "Code rejected ({} of {} attempts): {}",
                    challenge.attempts, self.policy.max_attempts, e
                );
                Err(e.into())
            }
        }
    }

    /// Abandon the flow; nothing is cleaned up server-side
    pub fn cancel(&mut self) {
        self.state = SignInState::PasswordEntry;
    }
}

/// Email and password registration confirmed by an emailed code
pub struct SignUpFlow {
    gateway: Arc<dyn OtpGateway>,
    clock: Arc<dyn Clock>,
    policy: OtpPolicy,
    state: SignUpState,
    /// Kept until verification for the login fallback
    password: Option<String>,
    on_authenticated: Option<AuthCallback>,
}

impl SignUpFlow {
    pub fn new(gateway: Arc<dyn OtpGateway>, clock: Arc<dyn Clock>, policy: OtpPolicy) -> Self {
        Self {
            gateway,
            clock,
            policy,
            state: SignUpState::RegistrationForm,
            password: None,
            on_authenticated: None,
        }
    }

    pub fn on_authenticated(mut self, callback: AuthCallback) -> Self {
        self.on_authenticated = Some(callback);
        self
    }

    pub fn state(&self) -> &SignUpState {
        &self.state
    }

    pub fn challenge(&self) -> Option<&OtpChallenge> {
        match &self.state {
            SignUpState::OtpPending(challenge) => Some(challenge),
            _ => None,
        }
    }

    /// Register, then send the confirmation code
    ///
    /// The flow moves to `OtpPending` once registration succeeds, even when
    /// the code could not be sent; the returned [`OtpDelivery`] says which.
    pub async fn submit_registration(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<OtpDelivery, FlowError> {
        if self.state != SignUpState::RegistrationForm {
            return Err(FlowError::WrongStep);
        }

        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(FlowError::MissingCredentials);
        }

        self.gateway.register(&email, password).await?;
        info!("Registration accepted, sending confirmation code");

        let identifier = Identifier::Email(email);
        let delivery = self.send_with_retry(&identifier).await;

        self.password = Some(password.to_string());
        self.state = SignUpState::OtpPending(OtpChallenge::new(
            identifier,
            self.clock.now(),
            &self.policy,
        ));
        Ok(delivery)
    }

    async fn send_with_retry(&self, identifier: &Identifier) -> OtpDelivery {
        if let Err(first) = self.gateway.send_otp(identifier).await {
            warn!("Sending confirmation code failed, retrying once: {}", first);
            tokio::time::sleep(self.policy.send_retry_delay).await;

            if let Err(second) = self.gateway.send_otp(identifier).await {
                warn!("Sending confirmation code failed again: {}", second);
                return OtpDelivery::Failed(second);
            }
        }
        OtpDelivery::Sent
    }

    pub async fn resend(&mut self) -> Result<(), FlowError> {
        let SignUpState::OtpPending(challenge) = &mut self.state else {
            return Err(FlowError::NotAwaitingCode);
        };

        resend_code(
            self.gateway.as_ref(),
            self.clock.as_ref(),
            &self.policy,
            challenge,
        )
        .await
    }

    /// Confirm the code; when the service returns no token, sign in with
    /// the registration password instead
    pub async fn verify(&mut self, code: &str) -> Result<VerifiedSession, FlowError> {
        let SignUpState::OtpPending(challenge) = &mut self.state else {
            return Err(FlowError::NotAwaitingCode);
        };

        let code = check_code(&self.policy, challenge, code)?;
        let password = self.password.as_deref().unwrap_or_default();

        let outcome = match self.gateway.verify_otp(&challenge.identifier, code).await {
            Ok(reply) => match reply.token() {
                Some(token) => Ok(Some(token.to_string())),
                None => {
                    debug!("No token in verification reply, signing in with password");
                    self.gateway
                        .login(challenge.identifier.value(), password)
                        .await
                        .map(|reply| reply.token().map(String::from))
                }
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(access_token) => {
                let session = VerifiedSession {
                    identifier: challenge.identifier.clone(),
                    access_token,
                };
                info!("Sign-up verified for {}", session.identifier.masked());
                notify(&self.on_authenticated, &session);
                self.password = None;
                self.state = SignUpState::Verified(session.clone());
                Ok(session)
            }
            Err(e) => {
                challenge.attempts += 1;
                warn!(
                    "Confirmation rejected ({} of {} attempts): {}",
                    challenge.attempts, self.policy.max_attempts, e
                );
                Err(e.into())
            }
        }
    }

    pub fn cancel(&mut self) {
        self.password = None;
        self.state = SignUpState::RegistrationForm;
    }
}
