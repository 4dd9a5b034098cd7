//! Client-side orchestration for the AdLoop signage player.
//!
//! - **[`Controller`]**: handle to the reconciliation session. It resolves
//!   the device identity, sends the startup heartbeat, fetches the assigned
//!   branch, then keeps playback in step with the backend through two
//!   recurring timers (heartbeat, branch-check). Current [`Screen`] and a
//!   [`ControllerSnapshot`] are published over `watch` channels.
//!
//! - **[`PlaylistPlayer`]**: looping playlist over a [`MediaSink`]. Natural
//!   end advances circularly; errors advance unless the playlist has a single
//!   item. [`ProcessSink`] drives an external player process.
//!
//! - **[`ClientState`]**: reconciliation state and change detection.
//!
//! - **[`IdentityProvider`]**: stable device identifier from configuration,
//!   the platform, or a persisted random id.

pub mod config;
pub mod controller;
pub mod error;
pub mod identity;
pub mod player;
pub mod screen;
pub mod sink;
pub mod state;
pub mod timers;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ControllerConfig, DEFAULT_POLL_INTERVAL, IdentityConfig, PlayerCommand};
pub use controller::{Controller, ControllerSnapshot};
pub use error::CoreError;
pub use identity::{DeviceId, IdentityProvider, IdentitySource, ResolvedIdentity};
pub use player::{MediaSink, PlaylistPlayer, SinkError, SinkEvent, SinkEventKind, SourceId};
pub use screen::{Picker, PickerStatus, Screen};
pub use sink::ProcessSink;
pub use state::{ClientState, Transition};
pub use timers::TimerKind;

// Wire types consumers need alongside the controller.
pub use adloop_api::{Branch, BranchSummary, VideoItem};
