//! Account and session service for the Sabjaano marketing site.
//!
//! The server side issues a signed session cookie on login and guards
//! protected routes with it; the [`client`] module drives the
//! password + one-time-code sign-in flows against the identity service.

pub mod account;
pub mod api;
pub mod audit;
pub mod cli;
pub mod client;
pub mod config;
pub mod database;
pub mod security;
pub mod server;
