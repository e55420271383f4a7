//! Time-driven transitions: position reporting, natural track end and the
//! crossfade handoff.

use rand::Rng;
use tracing::{debug, error, warn};

use super::controller::{Controller, secs};
use super::types::{PlayerEvent, RepeatMode, TransportState};

/// Whether a handoff should start now.
///
/// A zero `duration` means the length is unknown, which never triggers.
pub(super) fn due(
    pending: bool,
    crossfade_seconds: f32,
    repeat: RepeatMode,
    duration: f64,
    position: f64,
) -> bool {
    !pending
        && crossfade_seconds > 0.0
        && repeat != RepeatMode::One
        && duration > 0.0
        && duration - position <= f64::from(crossfade_seconds)
}

impl Controller {
    /// Sample the device and run whatever time-based transition is due.
    pub fn tick(&mut self) {
        if !self.device.is_initialized() {
            return;
        }
        let Some(track) = self.current.clone() else {
            return;
        };
        let position = self.current_position();
        let duration = track.duration.as_secs_f64();

        if self.device.is_busy() {
            self.emit(PlayerEvent::PositionChanged {
                position,
                duration: duration.max(position),
            });
            if let Err(e) = self.store.remember_track_position(&track.path, position) {
                error!(error = %e, "cannot persist resume offset");
            }
            if due(
                self.crossfade_pending,
                self.playback.crossfade_seconds,
                self.playback.repeat_mode,
                duration,
                position,
            ) {
                self.crossfade_pending = true;
                self.crossfade_handoff();
            }
            return;
        }

        match self.state {
            TransportState::Paused => {
                self.emit(PlayerEvent::PositionChanged { position, duration });
            }
            TransportState::Playing => {
                // The stream drained on its own.
                self.emit(PlayerEvent::PositionChanged { position, duration });
                if let Err(e) = self.store.remember_track_position(&track.path, 0.0) {
                    error!(error = %e, "cannot reset resume offset");
                }
                let result = if self.playback.repeat_mode == RepeatMode::One {
                    self.play_track(&track, 0.0, true)
                } else {
                    self.next()
                };
                if let Err(e) = result {
                    error!(error = %e, "cannot advance after track end");
                }
            }
            TransportState::Stopped | TransportState::Error => {}
        }
    }

    /// Index that `next` would pick, without moving the cursor.
    fn peek_next_index(&mut self) -> Option<usize> {
        if self.queue.is_empty() {
            return None;
        }
        if self.playback.shuffle {
            return Some(self.rng.random_range(0..self.queue.len()));
        }
        self.queue.next_index(self.playback.repeat_mode)
    }

    /// Blend from the current stream into the next one.
    ///
    /// The next stream is loaded before the current one is faded, so a load
    /// failure leaves the current stream playing. With nothing to hand off
    /// to, the pending flag stays set and the track ends normally.
    pub(super) fn crossfade_handoff(&mut self) {
        let Some(index) = self.peek_next_index() else {
            debug!("crossfade due but nothing follows");
            return;
        };
        let Some(next) = self.queue.get(index).cloned() else {
            self.crossfade_pending = false;
            return;
        };

        let path = self.shaping.prepare(&next.path, &self.playback.preset);
        if let Err(e) = self.device.load(&path) {
            warn!(track = %next.path.display(), error = %e, "crossfade load failed");
            self.crossfade_pending = false;
            return;
        }

        let fade = secs(f64::from(self.playback.crossfade_seconds));
        self.device.fade_out(fade);
        if let Err(e) = self.device.play(secs(0.0), fade) {
            warn!(track = %next.path.display(), error = %e, "crossfade start failed");
            self.crossfade_pending = false;
            return;
        }

        if let Some(old) = self.current.as_ref() {
            if let Err(e) = self.store.remember_track_position(&old.path, 0.0) {
                error!(error = %e, "cannot reset resume offset");
            }
        }
        self.offset = 0.0;
        self.loaded_path = Some(path);
        self.current = Some(next.clone());
        self.queue.set_cursor(Some(index));
        self.apply_volume();
        self.history.push(next.clone());
        debug!(track = %next.path.display(), "crossfaded");
        self.emit(PlayerEvent::TrackChanged(Some(next)));
        self.crossfade_pending = false;
    }
}
