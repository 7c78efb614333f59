use anyhow::{Context, Result};

use crate::audit;
use crate::database::{self, DbPool};

/// Print the most recent audit events, newest first
pub fn show_recent(pool: &DbPool, limit: usize) -> Result<()> {
    let conn = database::get_connection(pool)?;
    let events = audit::recent_events(&conn, limit).context("Failed to read audit log")?;

    if events.is_empty() {
        println!("No audit events recorded");
        return Ok(());
    }

    println!("{:<25} {:<18} {:<36} {}", "TIMESTAMP", "EVENT", "ACCOUNT", "DETAILS");
    for event in events {
        println!(
            "{:<25} {:<18} {:<36} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            event.event_type.as_str(),
            event.account_id.as_deref().unwrap_or("-"),
            event.details.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
