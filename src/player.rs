//! Playback controller.
//!
//! Decides what plays and when: queue and cursor, shuffle and repeat, play
//! history, crossfade handoffs, loudness normalization and resume offsets.
//! The controller runs on a dedicated thread behind [`PlayerHandle`] and
//! reports through [`PlayerEvent`]s.

mod controller;
mod crossfade;
mod handle;
mod history;
mod queue;
mod types;
mod volume;

pub use handle::PlayerHandle;
pub use types::{PlayerCmd, PlayerError, PlayerEvent, RepeatMode, TransportState};
