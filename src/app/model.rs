//! Front-end model: `App`.
//!
//! `App` mirrors what the player publishes (queue, current track, transport
//! state, position) plus the playback preferences read back from the
//! settings store, and keeps the purely visual state (selection, search
//! prompt, status message) the UI needs.

use std::path::PathBuf;

use crate::library::{Playlist, Track};
use crate::player::{PlayerEvent, TransportState};
use crate::store::PlaybackState;

/// Crossfade lengths offered by the `c` key, in seconds.
pub const CROSSFADE_STEPS: [f32; 4] = [0.0, 3.0, 5.0, 10.0];

/// Next crossfade step after `current`; values off the list restart at 0.
pub fn next_crossfade(current: f32) -> f32 {
    CROSSFADE_STEPS
        .iter()
        .position(|s| (s - current).abs() < f32::EPSILON)
        .map(|i| CROSSFADE_STEPS[(i + 1) % CROSSFADE_STEPS.len()])
        .unwrap_or(CROSSFADE_STEPS[0])
}

pub struct App {
    pub queue: Vec<Track>,
    pub selected: usize,
    pub now_playing: Option<Track>,
    pub transport: TransportState,
    /// Seconds into the current track.
    pub position: f64,
    /// Length of the current track in seconds; 0 when unknown.
    pub duration: f64,
    pub playback: PlaybackState,
    pub folder: Option<PathBuf>,
    /// Folder name and size, e.g. `Jazz (12 tracks)`.
    pub folder_label: String,
    pub pinned: bool,

    /// Move the selection along with the playing track.
    pub follow_playback: bool,

    pub search_mode: bool,
    pub search_query: String,

    /// One-line message shown under the status box.
    pub status: Option<String>,
}

impl App {
    pub fn new(playback: PlaybackState) -> Self {
        Self {
            queue: Vec::new(),
            selected: 0,
            now_playing: None,
            transport: TransportState::Stopped,
            position: 0.0,
            duration: 0.0,
            playback,
            folder: None,
            folder_label: String::new(),
            pinned: false,
            follow_playback: true,
            search_mode: false,
            search_query: String::new(),
            status: None,
        }
    }

    pub fn set_folder(&mut self, playlist: &Playlist) {
        self.folder = Some(playlist.path.clone());
        self.folder_label = format!("{} ({} tracks)", playlist.name(), playlist.track_count());
    }

    /// Fold one player event into the model.
    pub fn apply_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::PositionChanged { position, duration } => {
                self.position = position;
                self.duration = duration;
            }
            PlayerEvent::StateChanged(state) => {
                self.transport = state;
            }
            PlayerEvent::TrackChanged(track) => {
                self.position = 0.0;
                self.duration = track
                    .as_ref()
                    .map(|t| t.duration.as_secs_f64())
                    .unwrap_or(0.0);
                self.now_playing = track;
                if self.follow_playback {
                    if let Some(idx) = self.now_playing_index() {
                        self.selected = idx;
                    }
                }
            }
            PlayerEvent::QueueUpdated(tracks) => {
                let keep = self.selected_track().map(|t| t.path.clone());
                self.queue = tracks;
                self.selected = keep
                    .and_then(|p| self.queue.iter().position(|t| t.path == p))
                    .unwrap_or(0);
                self.clamp_selected();
            }
        }
    }

    /// Index of the playing track in the queue, when it is queued.
    pub fn now_playing_index(&self) -> Option<usize> {
        let current = self.now_playing.as_ref()?;
        self.queue.iter().position(|t| t.path == current.path)
    }

    pub fn is_now_playing(&self, index: usize) -> bool {
        self.now_playing_index() == Some(index)
    }

    pub fn has_tracks(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.queue.get(self.selected)
    }

    #[cfg(test)]
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.clamp_selected();
    }

    fn clamp_selected(&mut self) {
        if self.queue.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.queue.len() {
            self.selected = self.queue.len() - 1;
        }
    }

    /// Move selection down, wrapping to the top.
    pub fn next(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.queue.len();
    }

    /// Move selection up, wrapping to the bottom.
    pub fn prev(&mut self) {
        if self.queue.is_empty() {
            return;
        }
        self.selected = match self.selected {
            0 => self.queue.len() - 1,
            n => n - 1,
        };
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
        if let Some(idx) = self.now_playing_index() {
            self.selected = idx;
        }
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Fraction of the current track already played, in `[0, 1]`.
    pub fn progress_ratio(&self) -> f64 {
        if self.duration <= 0.0 || !self.duration.is_finite() {
            return 0.0;
        }
        (self.position / self.duration).clamp(0.0, 1.0)
    }

    pub fn enter_search_mode(&mut self) {
        self.search_mode = true;
        self.search_query.clear();
    }

    /// Leave the search prompt without running it.
    pub fn cancel_search(&mut self) {
        self.search_mode = false;
        self.search_query.clear();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_query.push(c);
    }

    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
    }

    /// Close the prompt and hand back the trimmed query, if any.
    pub fn take_search_query(&mut self) -> Option<String> {
        self.search_mode = false;
        let query = std::mem::take(&mut self.search_query);
        let query = query.trim();
        if query.is_empty() {
            None
        } else {
            Some(query.to_string())
        }
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }
}
