use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::App;
use crate::library::Library;
use crate::player::PlayerHandle;
use crate::store::SettingsStore;

use super::startup;

/// Folders the `o` key cycles through: pinned first, then recent, then
/// anything scanned this session. Duplicates keep their first place.
pub fn folder_choices(pinned: Vec<PathBuf>, recent: Vec<PathBuf>, cached: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for p in pinned.into_iter().chain(recent).chain(cached) {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

/// The choice after `current`, wrapping. `None` when there is nowhere else
/// to go.
pub fn next_folder(choices: &[PathBuf], current: Option<&Path>) -> Option<PathBuf> {
    let pos = current.and_then(|c| choices.iter().position(|p| p == c));
    let next = match pos {
        Some(i) => choices.get((i + 1) % choices.len()),
        None => choices.first(),
    }?;
    if Some(next.as_path()) == current {
        return None;
    }
    Some(next.clone())
}

/// Scan `folder`, point the model at it and hand its tracks to the player.
pub fn open(
    folder: &Path,
    app: &mut App,
    library: &mut Library,
    store: &SettingsStore,
    player: &PlayerHandle,
) {
    let playlist = startup::open_folder(library, folder);
    app.set_folder(&playlist);
    app.pinned = store.pinned_folders().contains(&playlist.path);
    if playlist.tracks.is_empty() {
        app.set_status(format!("{} has no tracks", playlist.name()));
        return;
    }
    info!(folder = %playlist.path.display(), "switching folder");
    app.follow_playback_on();
    startup::load_initial_queue(player, store, &playlist);
}

/// Cycle to the next pinned, recent or cached folder.
pub fn open_next(app: &mut App, library: &mut Library, store: &SettingsStore, player: &PlayerHandle) {
    let cached = library
        .cached_folders()
        .into_iter()
        .map(|p| p.path.clone())
        .collect();
    let choices = folder_choices(store.pinned_folders(), store.recent_folders(), cached);
    match next_folder(&choices, app.folder.as_deref()) {
        Some(folder) => open(&folder, app, library, store, player),
        None => app.set_status("no other folders yet"),
    }
}

/// Drop every cached scan and scan the open folder again.
pub fn rescan(app: &mut App, library: &mut Library, store: &SettingsStore, player: &PlayerHandle) {
    let Some(folder) = app.folder.clone() else {
        return;
    };
    library.clear_cache();
    open(&folder, app, library, store, player);
}

/// Pin the open folder, or unpin it when already pinned.
pub fn toggle_pin(app: &mut App, store: &SettingsStore) {
    let Some(folder) = app.folder.clone() else {
        return;
    };
    let result = if app.pinned {
        store.unpin_folder(&folder)
    } else {
        store.pin_folder(&folder)
    };
    match result {
        Ok(()) => {
            app.pinned = !app.pinned;
            let verb = if app.pinned { "pinned" } else { "unpinned" };
            app.set_status(format!("{verb} {}", folder.display()));
        }
        Err(e) => {
            warn!(error = %e, "cannot change pin");
            app.set_status(format!("error: {e}"));
        }
    }
}

/// Forget where the open folder was left, so it starts from the top next time.
pub fn forget_position(app: &mut App, store: &SettingsStore) {
    let Some(folder) = app.folder.clone() else {
        return;
    };
    match store.clear_folder_history(&folder) {
        Ok(()) => app.set_status("folder will start from the top next time"),
        Err(e) => app.set_status(format!("error: {e}")),
    }
}

/// Drop the open folder from pins, recents, history and the scan cache.
pub fn forget_folder(app: &mut App, library: &mut Library) {
    let Some(folder) = app.folder.clone() else {
        return;
    };
    match library.remove_folder(&folder) {
        Ok(()) => {
            app.pinned = false;
            app.set_status(format!("forgot {}", folder.display()));
        }
        Err(e) => {
            warn!(error = %e, "cannot forget folder");
            app.set_status(format!("error: {e}"));
        }
    }
}
