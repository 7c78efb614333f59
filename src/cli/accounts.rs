use anyhow::{anyhow, Result};
use log::info;

use crate::account::{require_credentials, AuthError, AuthService};
use crate::cli::utils;
use crate::database::models::Role;

fn parse_role(role: &str) -> Result<Role> {
    Role::from_str(role).map_err(|e| anyhow!(e))
}

/// Create an account, reading the password from stdin
pub fn create_user(auth: &AuthService, email: &str, role: &str) -> Result<()> {
    let role = parse_role(role)?;
    let password = utils::read_password("Password: ")?;

    let credentials = require_credentials(Some(email), Some(&password))
        .ok_or_else(|| anyhow!("Email and password must not be empty"))?;

    match auth.register_with_role(&credentials, role) {
        Ok(account) => {
            info!("Created account {} ({})", account.id, account.role.as_str());
            println!("Created {} with role {}", account.email, account.role.as_str());
            println!("ID: {}", account.id);
            Ok(())
        }
        Err(AuthError::DuplicateEmail) => Err(anyhow!("An account for {} already exists", credentials.email)),
        Err(e) => Err(anyhow!("Failed to create account: {}", e)),
    }
}

/// Change the role of an existing account
pub fn set_role(auth: &AuthService, email: &str, role: &str) -> Result<()> {
    let role = parse_role(role)?;

    match auth.set_role(email, role) {
        Ok(account) => {
            println!("{} is now {}", account.email, account.role.as_str());
            Ok(())
        }
        Err(AuthError::AccountNotFound) => Err(anyhow!("No account found for {}", email.trim())),
        Err(e) => Err(anyhow!("Failed to change role: {}", e)),
    }
}
