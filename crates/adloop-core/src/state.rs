// ── Client playback state ──
//
// Owned exclusively by the controller session. `apply` is the only place the
// playback fields change wholesale; `record_started` tracks the playing item.

use adloop_api::{Branch, VideoItem, VideoKey};
use serde::Serialize;

/// In-memory reconciliation state.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClientState {
    pub has_branch: bool,
    pub has_videos: bool,
    pub is_paused: bool,
    pub current_videos: Vec<VideoItem>,
    /// Empty unless a resolved item is playing.
    pub current_video_id: String,
    /// `None` until the first reconciliation, and again after an unassigned
    /// result. Any poll seen in this state forces an apply.
    pub last_branch_id: Option<String>,
    pub last_paused: Option<bool>,
    /// Video identities of the last applied branch.
    pub last_video_keys: Vec<VideoKey>,
    /// Set by the first successful poll. Until then every polled branch is
    /// applied, even one identical to the startup fetch.
    pub polled: bool,
}

/// What the controller must do after `apply`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// No assignment: show the picker.
    Unassigned,
    /// Assignment is paused.
    Paused,
    /// Assignment has no videos.
    NoVideos,
    /// Load this playlist and start the timers.
    Play(Vec<VideoItem>),
}

impl ClientState {
    /// Reset playback fields for `branch` and record it as the baseline.
    pub fn apply(&mut self, branch: Option<&Branch>) -> Transition {
        self.current_video_id.clear();
        self.current_videos.clear();
        self.has_videos = false;

        let transition = match branch {
            None => {
                self.has_branch = false;
                self.is_paused = false;
                Transition::Unassigned
            }
            Some(b) if b.is_paused => {
                self.has_branch = true;
                self.is_paused = true;
                Transition::Paused
            }
            Some(b) if b.videos.is_empty() => {
                self.has_branch = true;
                self.is_paused = false;
                Transition::NoVideos
            }
            Some(b) => {
                self.has_branch = true;
                self.is_paused = false;
                self.has_videos = true;
                self.current_videos.clone_from(&b.videos);
                Transition::Play(b.videos.clone())
            }
        };

        self.last_branch_id = branch.map(|b| b.branch_id.clone());
        self.last_paused = branch.map(|b| b.is_paused);
        self.last_video_keys = branch
            .map(|b| b.videos.iter().map(VideoItem::key).collect())
            .unwrap_or_default();

        transition
    }

    /// Whether a polled branch differs from the baseline.
    pub fn needs_apply(&self, branch: &Branch) -> bool {
        if !self.polled {
            return true;
        }
        let Some(last_id) = self.last_branch_id.as_deref() else {
            return true;
        };
        if last_id != branch.branch_id || self.last_paused != Some(branch.is_paused) {
            return true;
        }
        self.last_video_keys.len() != branch.videos.len()
            || self
                .last_video_keys
                .iter()
                .zip(&branch.videos)
                .any(|(key, video)| key.id != video.id || key.updated_at != video.updated_at)
    }

    /// Mark a successful poll as reconciled.
    pub fn record_poll(&mut self) {
        self.polled = true;
    }

    /// Record the item that just started. Ignored unless playing.
    pub fn record_started(&mut self, video_id: &str) {
        if self.has_videos {
            video_id.clone_into(&mut self.current_video_id);
        }
    }

    /// Playback halted without a new apply (e.g. a single-item playlist
    /// failed). The playlist stays; nothing is playing.
    pub fn record_stopped(&mut self) {
        self.current_video_id.clear();
    }

    /// `has_videos ⇒ has_branch ∧ ¬is_paused`, and playback fields are only
    /// populated while playing.
    pub fn invariants_hold(&self) -> bool {
        let playing_ok = !self.has_videos || (self.has_branch && !self.is_paused);
        let videos_ok = self.has_videos || self.current_videos.is_empty();
        let id_ok = self.has_videos || self.current_video_id.is_empty();
        playing_ok && videos_ok && id_ok
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn video(id: &str, updated_at: &str) -> VideoItem {
        VideoItem {
            id: id.into(),
            file_url: format!("/media/{id}.mp4"),
            duration: Some(10.0),
            updated_at: Some(updated_at.into()),
        }
    }

    fn branch(id: &str, paused: bool, videos: Vec<VideoItem>) -> Branch {
        Branch {
            branch_id: id.into(),
            branch_updated_at: None,
            videos,
            is_paused: paused,
        }
    }

    fn playing() -> Branch {
        branch("b1", false, vec![video("v1", "t1"), video("v2", "t1")])
    }

    #[test]
    fn invariants_hold_across_transitions() {
        let sequence = [
            Some(playing()),
            Some(branch("b1", true, vec![video("v1", "t1")])),
            None,
            Some(branch("b2", false, Vec::new())),
            Some(playing()),
            None,
        ];

        let mut state = ClientState::default();
        for b in &sequence {
            state.apply(b.as_ref());
            state.record_started("v1");
            assert!(state.invariants_hold(), "violated after {b:?}: {state:?}");
        }
    }

    #[test]
    fn stopped_clears_current_video() {
        let mut state = ClientState::default();
        state.apply(Some(&playing()));
        state.record_started("v1");
        state.record_stopped();

        assert_eq!(state.current_video_id, "");
        assert!(state.has_videos);
        assert!(state.invariants_hold());
    }

    #[test]
    fn apply_is_idempotent() {
        let b = playing();
        let mut state = ClientState::default();

        let first = state.apply(Some(&b));
        let snapshot = state.clone();
        let second = state.apply(Some(&b));

        assert_eq!(first, second);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn transitions_match_branch_shape() {
        let mut state = ClientState::default();

        assert_eq!(state.apply(None), Transition::Unassigned);
        assert_eq!(state.apply(Some(&branch("b", true, Vec::new()))), Transition::Paused);
        assert_eq!(state.apply(Some(&branch("b", false, Vec::new()))), Transition::NoVideos);
        assert!(matches!(state.apply(Some(&playing())), Transition::Play(v) if v.len() == 2));
        assert!(state.has_videos);
        assert_eq!(state.last_branch_id.as_deref(), Some("b1"));
        assert_eq!(state.last_paused, Some(false));
    }

    #[test]
    fn sentinel_always_applies() {
        let mut state = ClientState::default();
        state.record_poll();
        assert!(state.needs_apply(&playing()));

        state.apply(Some(&playing()));
        state.apply(None);
        assert!(state.needs_apply(&playing()));
    }

    #[test]
    fn first_poll_after_startup_always_applies() {
        let mut state = ClientState::default();
        state.apply(Some(&playing()));
        assert!(state.needs_apply(&playing()));

        state.record_poll();
        assert!(!state.needs_apply(&playing()));
    }

    #[test]
    fn identical_branch_is_not_reapplied() {
        let mut state = ClientState::default();
        state.record_poll();
        state.apply(Some(&playing()));
        assert!(!state.needs_apply(&playing()));

        let paused = branch("b1", true, vec![video("v1", "t1")]);
        state.apply(Some(&paused));
        assert!(!state.needs_apply(&paused));
    }

    #[test]
    fn change_detection() {
        let mut state = ClientState::default();
        state.record_poll();
        state.apply(Some(&playing()));

        let mut other_id = playing();
        other_id.branch_id = "b2".into();
        assert!(state.needs_apply(&other_id));

        let mut paused = playing();
        paused.is_paused = true;
        assert!(state.needs_apply(&paused));

        let mut longer = playing();
        longer.videos.push(video("v3", "t1"));
        assert!(state.needs_apply(&longer));

        let mut touched = playing();
        touched.videos[1].updated_at = Some("t2".into());
        assert!(state.needs_apply(&touched));

        let mut swapped = playing();
        swapped.videos.swap(0, 1);
        assert!(state.needs_apply(&swapped));
    }

    #[test]
    fn empty_to_non_empty_is_a_change() {
        let mut state = ClientState::default();
        state.record_poll();
        state.apply(Some(&branch("b1", false, Vec::new())));

        assert!(state.needs_apply(&playing()));
    }

    #[test]
    fn started_ignored_unless_playing() {
        let mut state = ClientState::default();
        state.apply(Some(&branch("b1", true, Vec::new())));
        state.record_started("v1");
        assert_eq!(state.current_video_id, "");

        state.apply(Some(&playing()));
        state.record_started("v2");
        assert_eq!(state.current_video_id, "v2");
    }
}
