// ── Screens ──
//
// Mutually exclusive views the controller renders. Consumers subscribe to
// the controller's screen channel and draw whatever is current.

use std::fmt;

use adloop_api::BranchSummary;
use serde::Serialize;

pub const PAUSED_TITLE: &str = "Display paused";
pub const PAUSED_SUBTITLE: &str = "Playback will resume when started again from the admin panel.";
pub const NO_VIDEOS_TITLE: &str = "No videos available";
pub const NO_VIDEOS_SUBTITLE: &str = "Waiting for videos to be assigned to this branch\u{2026}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    /// No assignment yet; the operator picks a branch.
    BranchPicker(Picker),
    /// Paused or no-content notice.
    Message { title: String, subtitle: String },
    /// Actively playing.
    Video,
}

impl Screen {
    pub fn paused() -> Self {
        Self::Message {
            title: PAUSED_TITLE.into(),
            subtitle: PAUSED_SUBTITLE.into(),
        }
    }

    pub fn no_videos() -> Self {
        Self::Message {
            title: NO_VIDEOS_TITLE.into(),
            subtitle: NO_VIDEOS_SUBTITLE.into(),
        }
    }

    pub fn picker(&self) -> Option<&Picker> {
        match self {
            Self::BranchPicker(picker) => Some(picker),
            _ => None,
        }
    }

    pub fn is_picker(&self) -> bool {
        matches!(self, Self::BranchPicker(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::BranchPicker(_) => "branch_picker",
            Self::Message { .. } => "message",
            Self::Video => "video",
        }
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::BranchPicker(Picker::default())
    }
}

/// Branch picker contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Picker {
    pub status: PickerStatus,
    /// Active branches, in backend order.
    pub branches: Vec<BranchSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum PickerStatus {
    /// Startup fetch in flight.
    #[default]
    Checking,
    Loading,
    Ready,
    Empty,
    Failed(String),
    Assigning,
    /// Assignment rejected; the list stays selectable.
    AssignFailed(String),
}

impl PickerStatus {
    /// Whether the operator can select a branch right now.
    pub fn is_selectable(&self) -> bool {
        matches!(self, Self::Ready | Self::AssignFailed(_))
    }
}

impl fmt::Display for PickerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => f.write_str("Checking branch assignment\u{2026}"),
            Self::Loading => f.write_str("Loading branches\u{2026}"),
            Self::Ready => f.write_str("Select a branch for this display."),
            Self::Empty => f.write_str("No active branches available."),
            Self::Failed(msg) => write!(f, "Failed to load branches. {msg}"),
            Self::Assigning => f.write_str("Assigning branch\u{2026}"),
            Self::AssignFailed(msg) => write!(f, "Failed to assign branch. {msg}"),
        }
    }
}
