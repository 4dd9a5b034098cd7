// ── Runtime client configuration ──
//
// These types describe *how* the signage client talks to the backend and
// plays media. They never touch disk: `adloop-config` (or a test) builds a
// `ControllerConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Default interval for both recurring timers.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10_000);

/// Configuration for one signage client instance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Backend base address (no trailing slash needed). `None` = unset;
    /// every remote operation then rejects.
    pub base_url: Option<Url>,
    /// Heartbeat timer period.
    pub heartbeat_interval: Duration,
    /// Branch-check (poll) timer period.
    pub branch_check_interval: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Where the device identity comes from.
    pub identity: IdentityConfig,
    /// External player used by the process sink.
    pub player: PlayerCommand,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            heartbeat_interval: DEFAULT_POLL_INTERVAL,
            branch_check_interval: DEFAULT_POLL_INTERVAL,
            timeout: Duration::from_secs(30),
            identity: IdentityConfig::default(),
            player: PlayerCommand::default(),
        }
    }
}

/// Device identity sources, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    /// Explicit identifier; wins over everything else.
    pub device_id: Option<String>,
    /// Platform-native identifier file (e.g. `/etc/machine-id`).
    pub platform_id_path: Option<PathBuf>,
    /// File holding the generated identifier between runs.
    pub store_path: Option<PathBuf>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            platform_id_path: cfg!(target_os = "linux").then(|| PathBuf::from("/etc/machine-id")),
            store_path: None,
        }
    }
}

/// External media player invocation.
///
/// The media URL is appended as the final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Pass `--input-ipc-server=<socket>` so pause/resume can be driven
    /// over mpv's JSON IPC (Unix only).
    pub ipc: bool,
}

impl Default for PlayerCommand {
    fn default() -> Self {
        Self {
            program: "mpv".into(),
            args: vec![
                "--really-quiet".into(),
                "--fs".into(),
                "--no-terminal".into(),
            ],
            ipc: true,
        }
    }
}
