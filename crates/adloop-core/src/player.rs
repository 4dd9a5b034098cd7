// ── Playlist player ──
//
// Plays an ordered list of videos in a continuous loop over an opaque media
// sink. Wraparound on natural end is the loop; there is no loop flag.
//
// The sink reports completion asynchronously as `SinkEvent`s tagged with the
// `SourceId` handed to `load`. Events for any other source are stale (the
// source was replaced or stopped) and are dropped.

use std::fmt;

use adloop_api::{MediaUrlResolver, VideoItem};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Identifies one `load` on a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Asynchronous outcome of a loaded source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEventKind {
    /// Played to completion.
    Ended,
    /// Playback failed after it started.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkEvent {
    pub source: SourceId,
    pub kind: SinkEventKind,
}

/// Synchronous sink failure.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to start playback: {0}")]
    Start(String),

    #[error("player control failed: {0}")]
    Control(String),
}

/// Opaque playable-media primitive.
///
/// A sink holds at most one source. Loading replaces the current source and
/// starts playing it.
pub trait MediaSink: Send {
    fn load(&mut self, source: SourceId, url: &Url) -> Result<(), SinkError>;

    /// Resume a paused source.
    fn resume(&mut self) -> Result<(), SinkError>;

    fn pause(&mut self) -> Result<(), SinkError>;

    /// Halt and detach the current source. No-op without one.
    fn unload(&mut self);

    fn has_source(&self) -> bool;
}

type StartedHook = Box<dyn FnMut(&VideoItem) + Send>;
type ErrorHook = Box<dyn FnMut(&VideoItem, &str) + Send>;

/// Looping playlist over a [`MediaSink`].
pub struct PlaylistPlayer<S> {
    sink: S,
    resolver: MediaUrlResolver,
    playlist: Vec<VideoItem>,
    index: usize,
    current_source: Option<SourceId>,
    next_source: u64,
    on_started: Option<StartedHook>,
    on_error: Option<ErrorHook>,
}

impl<S: MediaSink> PlaylistPlayer<S> {
    pub fn new(sink: S, resolver: MediaUrlResolver) -> Self {
        Self {
            sink,
            resolver,
            playlist: Vec::new(),
            index: 0,
            current_source: None,
            next_source: 0,
            on_started: None,
            on_error: None,
        }
    }

    /// Install the started hook, replacing any previous one.
    pub fn set_on_started(&mut self, hook: impl FnMut(&VideoItem) + Send + 'static) {
        self.on_started = Some(Box::new(hook));
    }

    /// Install the error hook, replacing any previous one.
    pub fn set_on_error(&mut self, hook: impl FnMut(&VideoItem, &str) + Send + 'static) {
        self.on_error = Some(Box::new(hook));
    }

    /// Replace the playlist and start at item 0.
    ///
    /// Current playback is stopped first. An empty list leaves the player
    /// stopped.
    pub fn load_branch(&mut self, videos: Vec<VideoItem>) {
        self.stop();
        if videos.is_empty() {
            return;
        }
        debug!(count = videos.len(), "loading playlist");
        self.playlist = videos;
        self.start_current();
    }

    /// Halt playback and clear the playlist. Idempotent.
    pub fn stop(&mut self) {
        if self.current_source.take().is_some() || self.sink.has_source() {
            self.sink.unload();
        }
        self.playlist.clear();
        self.index = 0;
    }

    /// Resume the current source. No-op when nothing is loaded.
    pub fn play(&mut self) -> Result<(), SinkError> {
        if self.current_source.is_none() || !self.sink.has_source() {
            return Ok(());
        }
        self.sink.resume()
    }

    /// Suspend the current source. No-op when nothing is loaded.
    pub fn pause(&mut self) -> Result<(), SinkError> {
        if self.current_source.is_none() || !self.sink.has_source() {
            return Ok(());
        }
        self.sink.pause()
    }

    pub fn current_video(&self) -> Option<&VideoItem> {
        self.playlist.get(self.index)
    }

    pub fn playlist(&self) -> &[VideoItem] {
        &self.playlist
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether a source is loaded and playing (or paused).
    pub fn is_active(&self) -> bool {
        self.current_source.is_some()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Feed an asynchronous sink event into the player.
    pub fn handle_event(&mut self, event: SinkEvent) {
        if self.current_source != Some(event.source) {
            debug!(source = %event.source, "ignoring stale sink event");
            return;
        }
        self.current_source = None;

        match event.kind {
            SinkEventKind::Ended => {
                self.advance();
                self.start_current();
            }
            SinkEventKind::Failed(reason) => {
                let Some(item) = self.current_video().cloned() else {
                    return;
                };
                self.report_error(&item, &reason);
                if self.playlist.len() > 1 {
                    self.advance();
                    self.start_current();
                } else {
                    self.sink.unload();
                }
            }
        }
    }

    fn advance(&mut self) {
        if !self.playlist.is_empty() {
            self.index = (self.index + 1) % self.playlist.len();
        }
    }

    /// Start the item at `index`, skipping items that fail synchronously.
    ///
    /// Gives up once every item has failed in a row.
    fn start_current(&mut self) {
        let len = self.playlist.len();
        for _ in 0..len {
            let Some(item) = self.current_video().cloned() else {
                return;
            };
            match self.try_start(&item) {
                Ok(source) => {
                    info!(video_id = %item.id, source = %source, "playing video");
                    self.current_source = Some(source);
                    if let Some(hook) = self.on_started.as_mut() {
                        hook(&item);
                    }
                    return;
                }
                Err(reason) => {
                    self.report_error(&item, &reason);
                    if len <= 1 {
                        break;
                    }
                    self.advance();
                }
            }
        }

        if len > 1 {
            warn!(count = len, "every playlist item failed to start");
        }
        self.sink.unload();
    }

    fn try_start(&mut self, item: &VideoItem) -> Result<SourceId, String> {
        let url = self
            .resolver
            .resolve(&item.file_url)
            .ok_or_else(|| format!("unresolvable media URL {:?}", item.file_url))?;
        let source = SourceId(self.next_source);
        self.next_source += 1;
        self.sink.load(source, &url).map_err(|e| e.to_string())?;
        Ok(source)
    }

    fn report_error(&mut self, item: &VideoItem, reason: &str) {
        warn!(video_id = %item.id, error = reason, "playback error");
        if let Some(hook) = self.on_error.as_mut() {
            hook(item, reason);
        }
    }
}

impl<S> fmt::Debug for PlaylistPlayer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaylistPlayer")
            .field("playlist", &self.playlist.len())
            .field("index", &self.index)
            .field("current_source", &self.current_source)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct FakeSink {
        loads: Vec<(SourceId, String)>,
        failing: HashSet<String>,
        loaded: bool,
        paused: bool,
        unloads: usize,
    }

    impl MediaSink for FakeSink {
        fn load(&mut self, source: SourceId, url: &Url) -> Result<(), SinkError> {
            if self.failing.contains(url.as_str()) {
                return Err(SinkError::Start("unsupported codec".into()));
            }
            self.loads.push((source, url.to_string()));
            self.loaded = true;
            self.paused = false;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), SinkError> {
            self.paused = false;
            Ok(())
        }

        fn pause(&mut self) -> Result<(), SinkError> {
            self.paused = true;
            Ok(())
        }

        fn unload(&mut self) {
            self.loaded = false;
            self.unloads += 1;
        }

        fn has_source(&self) -> bool {
            self.loaded
        }
    }

    fn video(id: &str) -> VideoItem {
        VideoItem {
            id: id.into(),
            file_url: format!("/media/{id}.mp4"),
            duration: None,
            updated_at: None,
        }
    }

    fn player() -> PlaylistPlayer<FakeSink> {
        let base = Url::parse("http://signage.local").ok();
        PlaylistPlayer::new(FakeSink::default(), MediaUrlResolver::new(base))
    }

    fn last_source(p: &PlaylistPlayer<FakeSink>) -> SourceId {
        p.sink().loads.last().map(|(s, _)| *s).expect("a load")
    }

    fn ended(source: SourceId) -> SinkEvent {
        SinkEvent {
            source,
            kind: SinkEventKind::Ended,
        }
    }

    fn failed(source: SourceId) -> SinkEvent {
        SinkEvent {
            source,
            kind: SinkEventKind::Failed("decoder error".into()),
        }
    }

    #[test]
    fn n_ended_events_loop_back_to_first_item() {
        let mut p = player();
        p.load_branch(vec![video("a"), video("b"), video("c")]);

        for _ in 0..3 {
            let source = last_source(&p);
            p.handle_event(ended(source));
        }

        assert_eq!(p.index(), 0);
        assert_eq!(p.current_video().map(|v| v.id.as_str()), Some("a"));
        assert_eq!(p.sink().loads.len(), 4);
    }

    #[test]
    fn started_hook_fires_for_each_item() {
        let started = Arc::new(Mutex::new(Vec::new()));
        let mut p = player();
        let seen = Arc::clone(&started);
        p.set_on_started(move |v| seen.lock().unwrap().push(v.id.clone()));

        p.load_branch(vec![video("a"), video("b")]);
        p.handle_event(ended(last_source(&p)));

        assert_eq!(*started.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn error_on_middle_item_advances_to_next() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let mut p = player();
        let seen = Arc::clone(&errors);
        p.set_on_error(move |v, _| seen.lock().unwrap().push(v.id.clone()));

        p.load_branch(vec![video("a"), video("b"), video("c")]);
        p.handle_event(ended(last_source(&p)));
        assert_eq!(p.index(), 1);

        p.handle_event(failed(last_source(&p)));

        assert_eq!(*errors.lock().unwrap(), vec!["b"]);
        assert_eq!(p.index(), 2);
        assert!(p.is_active());
        assert_eq!(
            p.sink().loads.last().map(|(_, u)| u.as_str()),
            Some("http://signage.local/media/c.mp4")
        );
    }

    #[test]
    fn single_item_error_stays_stopped() {
        let mut p = player();
        p.load_branch(vec![video("only")]);
        let loads_before = p.sink().loads.len();

        p.handle_event(failed(last_source(&p)));

        assert!(!p.is_active());
        assert!(!p.sink().has_source());
        assert_eq!(p.sink().loads.len(), loads_before);
    }

    #[test]
    fn stale_events_are_ignored() {
        let mut p = player();
        p.load_branch(vec![video("a"), video("b")]);
        let old = last_source(&p);

        p.load_branch(vec![video("x"), video("y")]);
        p.handle_event(ended(old));

        assert_eq!(p.index(), 0);
        assert_eq!(p.current_video().map(|v| v.id.as_str()), Some("x"));
    }

    #[test]
    fn unresolvable_url_is_skipped_like_an_error() {
        let errors = Arc::new(Mutex::new(0));
        let mut p = player();
        let seen = Arc::clone(&errors);
        p.set_on_error(move |_, _| *seen.lock().unwrap() += 1);

        let mut broken = video("broken");
        broken.file_url = "   ".into();
        p.load_branch(vec![broken, video("ok")]);

        assert_eq!(*errors.lock().unwrap(), 1);
        assert_eq!(p.index(), 1);
        assert!(p.is_active());
    }

    #[test]
    fn all_items_failing_to_start_stops_instead_of_spinning() {
        let mut p = player();
        p.sink_mut().failing.extend([
            "http://signage.local/media/a.mp4".to_owned(),
            "http://signage.local/media/b.mp4".to_owned(),
        ]);

        p.load_branch(vec![video("a"), video("b")]);

        assert!(!p.is_active());
        assert!(p.sink().loads.is_empty());
    }

    #[test]
    fn empty_playlist_is_a_no_op() {
        let mut p = player();
        p.load_branch(Vec::new());

        assert!(!p.is_active());
        assert!(p.current_video().is_none());
    }

    #[test]
    fn stop_is_idempotent_and_clears_playlist() {
        let mut p = player();
        p.load_branch(vec![video("a"), video("b")]);
        p.handle_event(ended(last_source(&p)));

        p.stop();
        p.stop();

        assert!(p.playlist().is_empty());
        assert_eq!(p.index(), 0);
        assert!(p.current_video().is_none());
        assert_eq!(p.sink().unloads, 1);
    }

    #[test]
    fn play_and_pause_leave_position_alone() {
        let mut p = player();
        p.play().unwrap();
        assert!(!p.sink().paused);

        p.load_branch(vec![video("a"), video("b")]);
        p.handle_event(ended(last_source(&p)));
        p.pause().unwrap();
        assert!(p.sink().paused);
        p.play().unwrap();

        assert!(!p.sink().paused);
        assert_eq!(p.index(), 1);
        assert_eq!(p.playlist().len(), 2);
    }
}
