//! Persistent settings store.
//!
//! Holds the playback preferences, per-track resume offsets and folder
//! history in a TOML file. The store is shared between the playback
//! controller, the library index and the front-end through an `Arc`; every
//! mutation is written through to disk before it returns.

mod file;
mod model;

pub use file::SettingsStore;
pub use model::{MAX_CROSSFADE_SECONDS, PlaybackState};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings file is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}
