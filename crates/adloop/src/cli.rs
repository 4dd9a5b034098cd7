//! Clap derive structures for the `adloop` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// adloop -- digital-signage client for AdLoop displays
#[derive(Debug, Parser)]
#[command(
    name = "adloop",
    version,
    about = "Play the AdLoop branch assigned to this display",
    long_about = "Digital-signage client for AdLoop.\n\n\
        Registers this display with the backend, plays its assigned branch on\n\
        loop, follows branch changes and reports liveness.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend base URL (overrides the config file)
    #[arg(long, env = "ADLOOP_API_BASE_URL", global = true)]
    pub api_url: Option<String>,

    /// Device identifier (overrides platform and stored identity)
    #[arg(long, env = "ADLOOP_DEVICE_ID", global = true)]
    pub device_id: Option<String>,

    /// Config file path
    #[arg(long, env = "ADLOOP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, env = "ADLOOP_TIMEOUT_SECS", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the signage client until interrupted
    Run(RunArgs),

    /// List branches available for assignment
    #[command(alias = "ls")]
    Branches(BranchesArgs),

    /// Assign a branch to this display
    Assign {
        /// Branch ID
        branch_id: String,
    },

    /// Show the branch currently assigned to this display
    Status,

    /// Print this display's device identifier
    DeviceId,

    /// Send a single heartbeat
    Heartbeat,

    /// Manage the configuration file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Assign this branch automatically when the display is unassigned
    #[arg(long)]
    pub branch: Option<String>,

    /// Never prompt; wait for an assignment made elsewhere
    #[arg(long)]
    pub no_interactive: bool,
}

#[derive(Debug, Args)]
pub struct BranchesArgs {
    /// Include inactive branches
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the effective configuration
    Show,

    /// Write a config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
