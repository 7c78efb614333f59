pub mod auth;
pub mod leads;
pub mod session;

pub use auth::{login_handler, logout_handler, me_handler, signup_handler, status_handler};
pub use leads::{email_signup_handler, enquiry_handler};
pub use session::session_handler;
