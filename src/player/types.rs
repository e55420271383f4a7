//! Player-facing enums, events and commands.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::DeviceError;
use crate::library::Track;
use crate::store::StoreError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop after the last track of the queue.
    #[default]
    Off,
    /// Repeat the current track when it ends.
    One,
    /// Wrap around to the start of the queue.
    All,
}

impl RepeatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::One => "one",
            RepeatMode::All => "all",
        }
    }

    /// off -> all -> one -> off
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

impl FromStr for RepeatMode {
    type Err = PlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(RepeatMode::Off),
            "one" => Ok(RepeatMode::One),
            "all" => Ok(RepeatMode::All),
            other => Err(PlayerError::InvalidArgument(format!(
                "repeat mode must be 'off', 'one' or 'all', got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime transport state. Never persisted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
    /// The device rejected a load or play. Behaves like `Stopped`.
    Error,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportState::Stopped => "stopped",
            TransportState::Playing => "playing",
            TransportState::Paused => "paused",
            TransportState::Error => "error",
        })
    }
}

/// Everything the player publishes to the outside world.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Seconds into the current track and its length in seconds.
    PositionChanged { position: f64, duration: f64 },
    StateChanged(TransportState),
    TrackChanged(Option<Track>),
    QueueUpdated(Vec<Track>),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("the queue is empty")]
    EmptyQueue,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("player thread is gone")]
    Disconnected,
}

/// Operations accepted by the player thread.
#[derive(Debug, Clone)]
pub enum PlayerCmd {
    LoadQueue {
        tracks: Vec<Track>,
        start_index: usize,
    },
    PlayTrack {
        track: Track,
        start_at: f64,
        force_restart: bool,
    },
    TogglePlayPause,
    Stop,
    Next,
    Previous,
    /// Absolute position in seconds.
    Seek(f64),
    SetVolume(f32),
    SetMute(bool),
    ToggleMute,
    SetShuffle(bool),
    SetRepeatMode(RepeatMode),
    SetCrossfade(f32),
    SetNormalization(bool),
    SetShapingPreset(String),
    EnqueueNext(Track),
    AppendToQueue(Track),
    RemoveFromQueue(PathBuf),
}

/// Point-in-time copy of the player's observable state.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub queue: Vec<Track>,
    pub cursor: Option<usize>,
    pub current: Option<Track>,
    pub position: f64,
    pub muted: bool,
    pub state: TransportState,
    pub history: Vec<Track>,
}
