//! Device identity and one-shot heartbeat.

use std::time::Duration;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// Print the resolved device id; the source goes to stderr with `-v`.
pub fn show_id(global: &GlobalOpts) -> Result<(), CliError> {
    let identity = config::identity(global)?;
    tracing::info!(source = %identity.source, "device identity resolved");
    if !global.quiet {
        println!("{}", identity.id);
    }
    Ok(())
}

/// Report liveness once, with no video playing.
pub async fn heartbeat(global: &GlobalOpts) -> Result<(), CliError> {
    let (client, identity) = config::client(global)?;
    client
        .send_heartbeat(identity.id.as_str(), "", Duration::ZERO, None)
        .await?;
    if !global.quiet {
        eprintln!("Heartbeat sent for device {}", identity.id);
    }
    Ok(())
}
