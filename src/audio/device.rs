use std::path::Path;
use std::time::Duration;

use super::DeviceError;

/// What the player needs from a sound output.
///
/// A device holds at most one loaded stream. Offsets are only honoured at
/// load time: `play` starts the stream loaded by the last `load` call at
/// `start_at`. Status queries never block.
pub trait OutputDevice {
    fn is_initialized(&self) -> bool;

    /// Open the underlying output if that has not happened yet.
    fn ensure_initialized(&mut self) -> Result<(), DeviceError>;

    /// Validate and stage `path` for the next `play`.
    fn load(&mut self, path: &Path) -> Result<(), DeviceError>;

    /// Start the staged stream at `start_at`, ramping up over `fade_in`.
    /// Whatever was playing before is replaced, unless it was handed to
    /// `fade_out` first.
    fn play(&mut self, start_at: Duration, fade_in: Duration) -> Result<(), DeviceError>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn stop(&mut self);

    /// Let the current stream die out over `duration` without blocking.
    /// The stream is detached: later calls do not affect it.
    fn fade_out(&mut self, duration: Duration);

    /// Time played since the last `play`, excluding paused spans.
    fn elapsed(&self) -> Duration;

    /// True while a stream is audibly playing: loaded, not paused, not drained.
    fn is_busy(&self) -> bool;

    /// Set output gain in `[0, 1]`.
    fn set_volume(&mut self, volume: f32);
}
