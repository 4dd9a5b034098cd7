//! Assigned-branch status.

use std::fmt::Write as _;

use adloop_core::Branch;
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct StatusView {
    device_id: String,
    identity_source: String,
    branch: Option<Branch>,
}

fn detail(view: &StatusView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Device:   {} ({})", view.device_id, view.identity_source);
    match &view.branch {
        None => {
            let _ = write!(out, "Branch:   (none assigned)");
        }
        Some(b) => {
            let _ = writeln!(out, "Branch:   {}", b.branch_id);
            let _ = writeln!(
                out,
                "Updated:  {}",
                b.branch_updated_at.as_deref().unwrap_or("-")
            );
            let _ = writeln!(out, "Paused:   {}", if b.is_paused { "yes" } else { "no" });
            let _ = write!(out, "Videos:   {}", b.videos.len());
            for (i, v) in b.videos.iter().enumerate() {
                let _ = write!(out, "\n  {:>2}. {}  {}", i + 1, v.id, v.file_url);
            }
        }
    }
    out
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (client, identity) = config::client(global)?;
    let branch = client.fetch_assigned_branch(identity.id.as_str()).await?;

    let view = StatusView {
        device_id: identity.id.to_string(),
        identity_source: identity.source.to_string(),
        branch,
    };

    let out = output::render_single(&global.output, &view, detail, |v| {
        v.branch
            .as_ref()
            .map(|b| b.branch_id.clone())
            .unwrap_or_default()
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
