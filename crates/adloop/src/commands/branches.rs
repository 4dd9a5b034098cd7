//! Branch listing.

use adloop_api::BranchSummary;
use tabled::Tabled;

use crate::cli::{BranchesArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct BranchRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Videos")]
    videos: u32,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&BranchSummary> for BranchRow {
    fn from(b: &BranchSummary) -> Self {
        Self {
            id: b.id.clone(),
            name: b.label(),
            description: b.description_text().unwrap_or_default().to_owned(),
            videos: b.video_count,
            active: if b.is_active { "yes" } else { "no" }.into(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: BranchesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (client, _) = config::client(global)?;

    let mut branches = client.list_branches().await?;
    if !args.all {
        branches.retain(|b| b.is_active);
    }

    if branches.is_empty() && !global.quiet {
        eprintln!("No active branches available.");
    }

    let out = output::render_list(
        &global.output,
        &branches,
        |b| BranchRow::from(b),
        |b| b.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
