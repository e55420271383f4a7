use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::player::RepeatMode;
use crate::shaping::Preset;

/// Longest crossfade accepted, in seconds.
pub const MAX_CROSSFADE_SECONDS: f32 = 10.0;

/// Playback preferences that survive a restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackState {
    /// Base output volume, 0.0 to 1.0.
    pub volume: f32,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
    /// Crossfade length in seconds, 0 to 10.
    pub crossfade_seconds: f32,
    pub normalization: bool,
    /// Name of the active shaping preset.
    pub preset: String,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            volume: 0.8,
            muted: false,
            shuffle: false,
            repeat_mode: RepeatMode::Off,
            crossfade_seconds: 3.0,
            normalization: true,
            preset: Preset::Flat.name().to_string(),
        }
    }
}

impl PlaybackState {
    /// Pull hand-edited values back into range: volume to 0..=1 and the
    /// crossfade to 0..=10 seconds. Non-finite values take the defaults.
    pub(super) fn clamp_ranges(&mut self) {
        let defaults = Self::default();
        self.volume = if self.volume.is_finite() {
            self.volume.clamp(0.0, 1.0)
        } else {
            defaults.volume
        };
        self.crossfade_seconds = if self.crossfade_seconds.is_finite() {
            self.crossfade_seconds.clamp(0.0, MAX_CROSSFADE_SECONDS)
        } else {
            defaults.crossfade_seconds
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(super) struct FolderPosition {
    pub track: PathBuf,
    pub position: f64,
}

/// On-disk layout. Plain values come before tables so the TOML writer never
/// has to emit a value after a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct StoreData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_opened_folder: Option<PathBuf>,
    pub pinned_folders: Vec<PathBuf>,
    pub recent_folders: Vec<PathBuf>,
    pub playback: PlaybackState,
    pub track_positions: BTreeMap<String, f64>,
    pub folder_positions: BTreeMap<String, FolderPosition>,
}
