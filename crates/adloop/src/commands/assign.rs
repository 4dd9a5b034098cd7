//! Branch assignment.

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

pub async fn handle(branch_id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let (client, identity) = config::client(global)?;

    client
        .assign_branch(identity.id.as_str(), branch_id)
        .await
        .map_err(|e| {
            if e.is_not_found() {
                CliError::NotFound {
                    resource_type: "device".into(),
                    identifier: identity.id.to_string(),
                    list_command: "device-id".into(),
                }
            } else {
                e.into()
            }
        })?;

    if !global.quiet {
        eprintln!("Assigned branch {branch_id} to device {}", identity.id);
    }
    Ok(())
}
