//! The playback controller.
//!
//! Owns the queue, the history and the transport state, and drives an
//! [`OutputDevice`]. It is single-threaded: every mutation, including the
//! periodic [`Controller::tick`], happens through `&mut self`, so user actions
//! and time-based transitions can never interleave.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;
use tracing::{debug, error, info};

use crate::audio::OutputDevice;
use crate::library::Track;
use crate::shaping::{Preset, ShapingCache};
use crate::store::{MAX_CROSSFADE_SECONDS, PlaybackState, SettingsStore};

use super::history::History;
use super::queue::Queue;
use super::types::{PlayerCmd, PlayerError, PlayerEvent, RepeatMode, Snapshot, TransportState};
use super::volume::effective_volume;

/// Seconds to `Duration`, treating negative and non-finite values as zero.
pub(super) fn secs(s: f64) -> Duration {
    if s.is_finite() && s > 0.0 {
        Duration::from_secs_f64(s)
    } else {
        Duration::ZERO
    }
}

pub struct Controller {
    pub(super) device: Box<dyn OutputDevice>,
    pub(super) store: Arc<SettingsStore>,
    pub(super) shaping: ShapingCache,
    events: Sender<PlayerEvent>,
    pub(super) rng: StdRng,
    /// Cached copy of the persisted preferences; written through on change.
    pub(super) playback: PlaybackState,
    pub(super) queue: Queue,
    pub(super) history: History,
    pub(super) current: Option<Track>,
    /// Seconds into `current` at which the device stream was started.
    pub(super) offset: f64,
    /// Stream handed to the device for `current`, after shaping.
    pub(super) loaded_path: Option<PathBuf>,
    pub(super) state: TransportState,
    pub(super) crossfade_pending: bool,
}

impl Controller {
    pub fn new(
        device: Box<dyn OutputDevice>,
        store: Arc<SettingsStore>,
        shaping: ShapingCache,
        events: Sender<PlayerEvent>,
        rng: StdRng,
    ) -> Self {
        let playback = store.playback_state();
        Self {
            device,
            store,
            shaping,
            events,
            rng,
            playback,
            queue: Queue::new(),
            history: History::default(),
            current: None,
            offset: 0.0,
            loaded_path: None,
            state: TransportState::Stopped,
            crossfade_pending: false,
        }
    }

    pub(super) fn emit(&self, event: PlayerEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn emit_queue(&self) {
        self.emit(PlayerEvent::QueueUpdated(self.queue.tracks().to_vec()));
    }

    /// Dispatch a command from the player thread.
    pub fn apply(&mut self, cmd: PlayerCmd) -> Result<(), PlayerError> {
        match cmd {
            PlayerCmd::LoadQueue {
                tracks,
                start_index,
            } => self.load_queue(tracks, start_index),
            PlayerCmd::PlayTrack {
                track,
                start_at,
                force_restart,
            } => self.play_track(&track, start_at, force_restart),
            PlayerCmd::TogglePlayPause => self.toggle_play_pause(),
            PlayerCmd::Stop => {
                self.stop();
                Ok(())
            }
            PlayerCmd::Next => self.next(),
            PlayerCmd::Previous => self.previous(),
            PlayerCmd::Seek(pos) => self.seek(pos),
            PlayerCmd::SetVolume(v) => self.set_volume(v),
            PlayerCmd::SetMute(m) => self.set_mute(m),
            PlayerCmd::ToggleMute => self.toggle_mute(),
            PlayerCmd::SetShuffle(s) => self.set_shuffle(s),
            PlayerCmd::SetRepeatMode(m) => self.set_repeat_mode(m),
            PlayerCmd::SetCrossfade(s) => self.set_crossfade(s),
            PlayerCmd::SetNormalization(n) => self.set_normalization(n),
            PlayerCmd::SetShapingPreset(name) => self.set_shaping_preset(&name),
            PlayerCmd::EnqueueNext(t) => self.enqueue_next(t),
            PlayerCmd::AppendToQueue(t) => {
                self.append_to_queue(t);
                Ok(())
            }
            PlayerCmd::RemoveFromQueue(p) => self.remove_from_queue(&p),
        }
    }

    // ---------------------------------------------------------------------
    // Transport
    // ---------------------------------------------------------------------

    /// Replace the queue with `tracks` and start at `start_index` (clamped),
    /// resuming from the track's remembered offset.
    pub fn load_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<(), PlayerError> {
        if tracks.is_empty() {
            return Err(PlayerError::EmptyQueue);
        }
        // Pick the start track before duplicates are dropped.
        let track = tracks[start_index.min(tracks.len() - 1)].clone();
        self.queue.replace(tracks);
        self.queue.set_cursor(self.queue.position_of(&track.path));
        self.emit_queue();

        let resume = self.store.track_position(&track.path);
        self.play_track(&track, resume, false)
    }

    /// Start `track` at `start_at` seconds.
    ///
    /// A zero start that is not forced resumes from the remembered offset. A
    /// forced restart also resets that offset.
    pub fn play_track(
        &mut self,
        track: &Track,
        start_at: f64,
        force_restart: bool,
    ) -> Result<(), PlayerError> {
        if let Err(e) = self.device.ensure_initialized() {
            error!(error = %e, "audio output unavailable");
            self.update_state(TransportState::Error)?;
            return Err(e.into());
        }

        let mut start_at = if start_at.is_finite() { start_at.max(0.0) } else { 0.0 };
        if start_at <= 0.0 && !force_restart {
            start_at = self.store.track_position(&track.path);
        }

        if self.queue.select(track) {
            self.emit_queue();
        }
        // Any explicit track change supersedes a pending handoff.
        self.crossfade_pending = false;

        let path = self.shaping.prepare(&track.path, &self.playback.preset);
        if force_restart {
            self.store.remember_track_position(&track.path, 0.0)?;
        }

        let fade_in = secs(f64::from(self.playback.crossfade_seconds) - 0.5);
        let started = match self.device.load(&path) {
            Ok(()) => self.device.play(secs(start_at), fade_in),
            Err(e) => Err(e),
        };
        if let Err(e) = started {
            error!(track = %track.path.display(), error = %e, "playback failed");
            // The cursor already points at the failed track; keep `current`
            // in step with it and silence whatever was playing.
            self.device.stop();
            self.current = Some(track.clone());
            self.loaded_path = None;
            self.offset = start_at;
            self.update_state(TransportState::Error)?;
            return Err(e.into());
        }

        self.loaded_path = Some(path);
        self.current = Some(track.clone());
        self.offset = start_at;
        self.apply_volume();
        self.history.push(track.clone());
        info!(track = %track.path.display(), start_at, "playing");
        self.emit(PlayerEvent::TrackChanged(Some(track.clone())));
        self.update_state(TransportState::Playing)
    }

    pub fn toggle_play_pause(&mut self) -> Result<(), PlayerError> {
        if !self.device.is_initialized() {
            return Ok(());
        }
        match self.state {
            TransportState::Playing => {
                self.device.pause();
                self.update_state(TransportState::Paused)
            }
            TransportState::Paused => {
                self.device.resume();
                self.update_state(TransportState::Playing)
            }
            TransportState::Stopped | TransportState::Error => Ok(()),
        }
    }

    pub fn stop(&mut self) {
        self.device.stop();
        self.queue.set_cursor(None);
        self.current = None;
        self.loaded_path = None;
        self.offset = 0.0;
        self.crossfade_pending = false;
        self.emit(PlayerEvent::TrackChanged(None));
        // Nothing is current, so no position is written and this cannot fail.
        self.state = TransportState::Stopped;
        self.emit(PlayerEvent::StateChanged(TransportState::Stopped));
    }

    pub fn next(&mut self) -> Result<(), PlayerError> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let index = if self.playback.shuffle {
            Some(self.rng.random_range(0..self.queue.len()))
        } else {
            self.queue.next_index(self.playback.repeat_mode)
        };

        match index.and_then(|i| self.queue.get(i).cloned()) {
            Some(track) => self.play_track(&track, 0.0, false),
            None => {
                self.stop();
                Ok(())
            }
        }
    }

    /// Step back. With shuffle on this walks the play history; otherwise it
    /// moves the cursor.
    pub fn previous(&mut self) -> Result<(), PlayerError> {
        if self.queue.is_empty() {
            return Ok(());
        }
        if self.playback.shuffle && self.history.len() >= 2 {
            self.history.pop();
            if let Some(track) = self.history.pop() {
                return self.play_track(&track, 0.0, false);
            }
        }
        match self
            .queue
            .previous_index(self.playback.repeat_mode)
            .and_then(|i| self.queue.get(i).cloned())
        {
            Some(track) => self.play_track(&track, 0.0, false),
            None => Ok(()),
        }
    }

    /// Restart the current track at `position` seconds.
    pub fn seek(&mut self, position: f64) -> Result<(), PlayerError> {
        if !position.is_finite() {
            return Err(PlayerError::InvalidArgument(format!(
                "seek position must be finite, got {position}"
            )));
        }
        let Some(track) = self.current.clone() else {
            return Ok(());
        };
        let duration = track.duration.as_secs_f64();
        let mut position = position.max(0.0);
        if duration > 0.0 {
            position = position.min(duration);
        }
        self.play_track(&track, position, position <= 0.0)
    }

    // ---------------------------------------------------------------------
    // Preferences
    // ---------------------------------------------------------------------

    fn update_playback(&mut self, f: impl FnOnce(&mut PlaybackState)) -> Result<(), PlayerError> {
        self.playback = self.store.update_playback_state(f)?;
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f32) -> Result<(), PlayerError> {
        if !volume.is_finite() {
            return Err(PlayerError::InvalidArgument(format!(
                "volume must be finite, got {volume}"
            )));
        }
        let volume = volume.clamp(0.0, 1.0);
        self.update_playback(|p| p.volume = volume)?;
        self.apply_volume();
        Ok(())
    }

    pub fn set_mute(&mut self, muted: bool) -> Result<(), PlayerError> {
        self.update_playback(|p| p.muted = muted)?;
        self.apply_volume();
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> Result<(), PlayerError> {
        self.set_mute(!self.playback.muted)
    }

    pub fn set_shuffle(&mut self, shuffle: bool) -> Result<(), PlayerError> {
        self.update_playback(|p| p.shuffle = shuffle)
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) -> Result<(), PlayerError> {
        self.update_playback(|p| p.repeat_mode = mode)
    }

    pub fn set_crossfade(&mut self, seconds: f32) -> Result<(), PlayerError> {
        if !seconds.is_finite() {
            return Err(PlayerError::InvalidArgument(format!(
                "crossfade must be finite, got {seconds}"
            )));
        }
        let seconds = seconds.clamp(0.0, MAX_CROSSFADE_SECONDS);
        self.update_playback(|p| p.crossfade_seconds = seconds)
    }

    pub fn set_normalization(&mut self, enabled: bool) -> Result<(), PlayerError> {
        self.update_playback(|p| p.normalization = enabled)?;
        self.apply_volume();
        Ok(())
    }

    /// Persist the preset and reload the current track at its live offset.
    /// A paused track stays paused.
    pub fn set_shaping_preset(&mut self, name: &str) -> Result<(), PlayerError> {
        let preset = Preset::from_name(name);
        self.update_playback(|p| p.preset = preset.name().to_string())?;

        let Some(track) = self.current.clone() else {
            return Ok(());
        };
        let was_paused = self.state == TransportState::Paused;
        let position = self.current_position();
        debug!(preset = preset.name(), position, "reloading with new preset");
        self.play_track(&track, position, position <= 0.0)?;
        if was_paused {
            self.device.pause();
            self.update_state(TransportState::Paused)?;
        }
        Ok(())
    }

    /// Push the effective volume for the current track to the device.
    pub(super) fn apply_volume(&mut self) {
        let Some(track) = self.current.as_ref() else {
            return;
        };
        if !self.device.is_initialized() {
            return;
        }
        let v = effective_volume(&self.playback, track.gain_db);
        self.device.set_volume(v);
    }

    // ---------------------------------------------------------------------
    // Queue editing
    // ---------------------------------------------------------------------

    /// Make `track` play right after the current one. Starts playback when
    /// nothing is playing, including after a device error.
    pub fn enqueue_next(&mut self, track: Track) -> Result<(), PlayerError> {
        let idle = self.queue.cursor().is_none()
            || matches!(self.state, TransportState::Stopped | TransportState::Error);
        if self.current.as_ref() == Some(&track) && !idle {
            self.emit_queue();
            return Ok(());
        }
        if idle {
            self.queue.insert_next(track.clone());
            self.emit_queue();
            return self.play_track(&track, 0.0, false);
        }
        self.queue.insert_next(track);
        self.emit_queue();
        Ok(())
    }

    pub fn append_to_queue(&mut self, track: Track) {
        self.queue.append(track);
        self.emit_queue();
    }

    /// Drop `path` from the queue. Removing the current track stops playback.
    pub fn remove_from_queue(&mut self, path: &Path) -> Result<(), PlayerError> {
        if self.queue.position_of(path).is_none() {
            return Ok(());
        }
        if self.current.as_ref().is_some_and(|t| t.path == path) {
            self.stop();
        }
        self.queue.remove(path);
        self.emit_queue();
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn current_queue(&self) -> Vec<Track> {
        self.queue.tracks().to_vec()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    /// Live offset: where the stream started plus what the device has played.
    pub fn current_position(&self) -> f64 {
        if self.current.is_none() || !self.device.is_initialized() {
            return 0.0;
        }
        self.offset + self.device.elapsed().as_secs_f64()
    }

    pub fn is_muted(&self) -> bool {
        self.playback.muted
    }

    pub fn transport_state(&self) -> TransportState {
        self.state
    }

    pub fn history(&self) -> Vec<Track> {
        self.history.to_vec()
    }

    pub fn playback_state(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            queue: self.current_queue(),
            cursor: self.queue.cursor(),
            current: self.current_track().cloned(),
            position: self.current_position(),
            muted: self.is_muted(),
            state: self.transport_state(),
            history: self.history(),
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    /// Enter `state`, announce it, and remember where the current track is.
    pub(super) fn update_state(&mut self, state: TransportState) -> Result<(), PlayerError> {
        self.state = state;
        self.emit(PlayerEvent::StateChanged(state));
        if !matches!(state, TransportState::Playing | TransportState::Paused) {
            return Ok(());
        }
        if let Some(track) = self.current.as_ref() {
            let position = self.current_position();
            self.store.remember_track_position(&track.path, position)?;
        }
        Ok(())
    }

    /// Fade out and persist the live offset before the thread exits.
    pub fn shutdown(&mut self, fade_out: Duration) {
        if let Some(track) = self.current.as_ref() {
            let position = self.current_position();
            if let Err(e) = self.store.remember_track_position(&track.path, position) {
                error!(error = %e, "cannot persist position on shutdown");
            }
        }
        if self.device.is_initialized() {
            self.device.fade_out(fade_out);
        }
        info!(state = %self.state, "player shutting down");
    }
}
