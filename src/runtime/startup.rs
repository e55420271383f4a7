use std::env;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::library::{Library, Playlist, Track};
use crate::player::{PlayerCmd, PlayerHandle};
use crate::store::SettingsStore;

/// Folder to open: the CLI argument, else the last opened folder (when it
/// still exists), else the current directory.
pub fn resolve_folder(arg: Option<String>, last_opened: Option<PathBuf>) -> PathBuf {
    if let Some(arg) = arg {
        return PathBuf::from(arg);
    }
    if let Some(last) = last_opened.filter(|p| p.is_dir()) {
        return last;
    }
    env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Scan `folder`; an unreadable folder gives an empty playlist.
pub fn open_folder(library: &mut Library, folder: &Path) -> Playlist {
    match library.add_folder(folder) {
        Ok(playlist) => playlist,
        Err(e) => {
            warn!(folder = %folder.display(), error = %e, "cannot open folder");
            Playlist::new(folder, Vec::new(), Vec::new())
        }
    }
}

/// Queue index of the folder's last played track, or 0.
pub fn start_index(tracks: &[Track], last_track: Option<&Path>) -> usize {
    last_track
        .and_then(|last| tracks.iter().position(|t| t.path == last))
        .unwrap_or(0)
}

/// Hand the folder to the player, starting where it was last left.
pub fn load_initial_queue(player: &PlayerHandle, store: &SettingsStore, playlist: &Playlist) {
    if playlist.tracks.is_empty() {
        info!(folder = %playlist.path.display(), "nothing to play");
        return;
    }
    let last = store.folder_last_track(&playlist.path);
    let start_index = start_index(&playlist.tracks, last.as_ref().map(|(p, _)| p.as_path()));
    let _ = player.send(PlayerCmd::LoadQueue {
        tracks: playlist.tracks.clone(),
        start_index,
    });
}
