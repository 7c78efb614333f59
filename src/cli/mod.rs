// Command-line administration
// Account provisioning commands run against the same database as the server.

pub mod accounts;
pub mod audit;
pub mod utils;
