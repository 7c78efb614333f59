// OTP client module
// Drives password + one-time-code sign-in and sign-up against the external
// identity service.

pub mod clock;
pub mod error;
pub mod flow;
pub mod gateway;
pub mod identifier;

pub use clock::{Clock, SystemClock};
pub use error::{OtpError, OtpErrorKind};
pub use flow::{
    AuthCallback, FlowError, OtpChallenge, OtpDelivery, OtpPolicy, SignInFlow, SignInState,
    SignUpFlow, SignUpState, VerifiedSession,
};
pub use gateway::{AuthReply, HttpOtpGateway, OtpGateway};
pub use identifier::{mask_identifier, Identifier};
