use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::LibrarySettings;
use crate::store::{SettingsStore, StoreError};

use super::LibraryError;
use super::model::{Playlist, Track};
use super::scan::scan;

/// Folder index with a per-folder playlist cache.
pub struct Library {
    settings: LibrarySettings,
    store: Arc<SettingsStore>,
    cache: HashMap<PathBuf, Playlist>,
}

fn canonical(folder: &Path) -> PathBuf {
    folder.canonicalize().unwrap_or_else(|_| folder.to_path_buf())
}

fn subfolders_of(folder: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(folder) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

impl Library {
    pub fn new(settings: LibrarySettings, store: Arc<SettingsStore>) -> Self {
        Self {
            settings,
            store,
            cache: HashMap::new(),
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached_folders(&self) -> Vec<&Playlist> {
        self.cache.values().collect()
    }

    /// Scan `folder` and record it as the most recent and last opened folder.
    pub fn add_folder(&mut self, folder: &Path) -> Result<Playlist, LibraryError> {
        let playlist = self.get_folder(folder, false)?;
        if let Err(e) = self.remember_opened(&playlist.path) {
            warn!(folder = %playlist.path.display(), error = %e, "failed to record folder");
        }
        Ok(playlist)
    }

    fn remember_opened(&self, folder: &Path) -> Result<(), StoreError> {
        self.store.add_recent_folder(folder)?;
        self.store.set_last_opened_folder(Some(folder))
    }

    pub fn remove_folder(&mut self, folder: &Path) -> Result<(), StoreError> {
        let folder = canonical(folder);
        self.cache.remove(&folder);
        self.store.remove_folder(&folder)
    }

    /// Return the playlist for `folder`, scanning it unless a cached copy
    /// exists and `use_cache` is set.
    pub fn get_folder(&mut self, folder: &Path, use_cache: bool) -> Result<Playlist, LibraryError> {
        let folder = canonical(folder);
        if use_cache {
            if let Some(p) = self.cache.get(&folder) {
                return Ok(p.clone());
            }
        }
        if !folder.is_dir() {
            warn!(folder = %folder.display(), "folder does not exist");
            return Err(LibraryError::NotADirectory(folder));
        }

        info!(folder = %folder.display(), "scanning folder");
        let tracks = scan(&folder, &self.settings);
        let playlist = Playlist::new(&folder, tracks, subfolders_of(&folder));
        self.cache.insert(folder, playlist.clone());
        Ok(playlist)
    }

    /// Tracks of `folder` matching `query`; an empty query returns them all.
    pub fn search_tracks(&mut self, folder: &Path, query: &str) -> Vec<Track> {
        let Ok(playlist) = self.get_folder(folder, true) else {
            return Vec::new();
        };
        let query = query.trim();
        if query.is_empty() {
            return playlist.tracks;
        }
        playlist
            .tracks
            .into_iter()
            .filter(|t| t.matches(query))
            .collect()
    }

    /// Search every cached folder, falling back to the last opened folder
    /// when nothing matched.
    pub fn global_search(&mut self, query: &str) -> Vec<Track> {
        let folders: Vec<PathBuf> = self.cache.keys().cloned().collect();
        let mut results: Vec<Track> = Vec::new();
        for folder in folders {
            results.extend(self.search_tracks(&folder, query));
        }
        if results.is_empty() {
            if let Some(last) = self.store.last_opened_folder() {
                results = self.search_tracks(&last, query);
            }
        }
        results
    }
}
