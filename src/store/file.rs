use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use super::StoreError;
use super::model::{FolderPosition, PlaybackState, StoreData};

const RECENT_FOLDER_LIMIT: usize = 10;

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// TOML-backed key/value store with write-through semantics.
///
/// Readers share a lock; each writer holds the write lock across the
/// in-memory update and the file replacement, so a read issued after a write
/// returns sees that write.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StoreData>,
}

impl SettingsStore {
    /// Open the store at `path`, creating it with defaults when missing.
    ///
    /// A file that cannot be parsed is copied to `*.bak` and replaced by
    /// defaults.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut data = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            match toml::from_str::<StoreData>(&raw) {
                Ok(d) => d,
                Err(e) => {
                    let backup = path.with_extension("bak");
                    warn!(path = %path.display(), error = %e, "corrupt settings, backing up");
                    fs::write(&backup, raw)?;
                    StoreData::default()
                }
            }
        } else {
            StoreData::default()
        };
        data.playback.clamp_ranges();

        let store = Self {
            path,
            data: RwLock::new(data),
        };
        if !store.path.exists() {
            let data = store.write();
            store.save(&data)?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreData> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreData> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        let body = toml::to_string_pretty(data)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `f` to the stored data and persist the result.
    fn mutate<T>(&self, f: impl FnOnce(&mut StoreData) -> T) -> Result<T, StoreError> {
        let mut data = self.write();
        let out = f(&mut data);
        self.save(&data)?;
        Ok(out)
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.read().playback.clone()
    }

    /// Update some fields of the playback state and return the new state.
    pub fn update_playback_state(
        &self,
        f: impl FnOnce(&mut PlaybackState),
    ) -> Result<PlaybackState, StoreError> {
        self.mutate(|d| {
            f(&mut d.playback);
            d.playback.clone()
        })
    }

    /// Resume offset in seconds for `track`, 0.0 when unknown.
    pub fn track_position(&self, track: &Path) -> f64 {
        self.read()
            .track_positions
            .get(&key(track))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn remember_track_position(&self, track: &Path, seconds: f64) -> Result<(), StoreError> {
        self.mutate(|d| {
            d.track_positions.insert(key(track), seconds.max(0.0));
        })
    }

    pub fn last_opened_folder(&self) -> Option<PathBuf> {
        self.read().last_opened_folder.clone()
    }

    pub fn set_last_opened_folder(&self, folder: Option<&Path>) -> Result<(), StoreError> {
        self.mutate(|d| d.last_opened_folder = folder.map(Path::to_path_buf))
    }

    /// Recent folders, most recent first.
    pub fn recent_folders(&self) -> Vec<PathBuf> {
        self.read().recent_folders.clone()
    }

    pub fn add_recent_folder(&self, folder: &Path) -> Result<(), StoreError> {
        self.mutate(|d| {
            d.recent_folders.retain(|f| f != folder);
            d.recent_folders.insert(0, folder.to_path_buf());
            d.recent_folders.truncate(RECENT_FOLDER_LIMIT);
        })
    }

    pub fn pinned_folders(&self) -> Vec<PathBuf> {
        self.read().pinned_folders.clone()
    }

    pub fn pin_folder(&self, folder: &Path) -> Result<(), StoreError> {
        if self.read().pinned_folders.iter().any(|f| f == folder) {
            return Ok(());
        }
        self.mutate(|d| d.pinned_folders.insert(0, folder.to_path_buf()))
    }

    pub fn unpin_folder(&self, folder: &Path) -> Result<(), StoreError> {
        self.mutate(|d| d.pinned_folders.retain(|f| f != folder))
    }

    /// Record `track` at `seconds` as the last thing played from `folder`.
    pub fn remember_folder_position(
        &self,
        folder: &Path,
        track: &Path,
        seconds: f64,
    ) -> Result<(), StoreError> {
        self.mutate(|d| {
            d.folder_positions.insert(
                key(folder),
                FolderPosition {
                    track: track.to_path_buf(),
                    position: seconds.max(0.0),
                },
            );
        })
    }

    pub fn folder_last_track(&self, folder: &Path) -> Option<(PathBuf, f64)> {
        self.read()
            .folder_positions
            .get(&key(folder))
            .map(|p| (p.track.clone(), p.position))
    }

    pub fn clear_folder_history(&self, folder: &Path) -> Result<(), StoreError> {
        self.mutate(|d| {
            d.folder_positions.remove(&key(folder));
        })
    }

    /// Forget `folder` everywhere: pins, recents, last opened and history.
    pub fn remove_folder(&self, folder: &Path) -> Result<(), StoreError> {
        self.mutate(|d| {
            d.pinned_folders.retain(|f| f != folder);
            d.recent_folders.retain(|f| f != folder);
            if d.last_opened_folder.as_deref() == Some(folder) {
                d.last_opened_folder = None;
            }
            d.folder_positions.remove(&key(folder));
        })
    }
}
