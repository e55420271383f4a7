use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};

use crate::app::{self, App};
use crate::config;
use crate::library::Library;
use crate::player::{PlayerCmd, PlayerEvent, PlayerHandle, TransportState};
use crate::shaping::{Preset, ShapingCache};
use crate::store::SettingsStore;
use crate::ui;

use super::folders;

/// Everything the loop talks to besides the terminal and the model.
pub struct Services<'a> {
    pub settings: &'a config::Settings,
    pub player: &'a PlayerHandle,
    pub events: &'a Receiver<PlayerEvent>,
    pub store: &'a SettingsStore,
    pub library: &'a mut Library,
    pub shaping: &'a ShapingCache,
}

/// Main terminal event loop: drains player events, draws, and handles keys.
/// Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    services: &mut Services<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        while let Ok(ev) = services.events.try_recv() {
            on_player_event(ev, app, services);
        }

        terminal.draw(|f| ui::draw(f, app, &services.settings.controls))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app, services) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn on_player_event(ev: PlayerEvent, app: &mut App, services: &Services<'_>) {
    if let PlayerEvent::TrackChanged(Some(track)) = &ev {
        if let Some(folder) = &app.folder {
            if let Err(e) = services
                .store
                .remember_folder_position(folder, &track.path, 0.0)
            {
                warn!(error = %e, "cannot remember folder position");
            }
        }
    }
    app.apply_event(ev);
}

/// Apply a settings command synchronously and read the result back from
/// the store so the status line shows what was persisted.
fn change_setting(cmd: PlayerCmd, app: &mut App, services: &Services<'_>) {
    if let Err(e) = services.player.request(cmd) {
        error!(error = %e, "setting change failed");
        app.set_status(format!("error: {e}"));
    }
    app.playback = services.store.playback_state();
}

fn send(cmd: PlayerCmd, app: &mut App, services: &Services<'_>) {
    if let Err(e) = services.player.send(cmd) {
        app.set_status(format!("error: {e}"));
    }
}

fn play_selected(app: &mut App, services: &Services<'_>) {
    let Some(track) = app.selected_track().cloned() else {
        return;
    };
    let already_playing =
        app.transport == TransportState::Playing && app.is_now_playing(app.selected);
    if already_playing {
        return;
    }
    app.follow_playback_on();
    send(
        PlayerCmd::PlayTrack {
            track,
            start_at: 0.0,
            force_restart: false,
        },
        app,
        services,
    );
}

fn scrub(app: &mut App, services: &Services<'_>, forward: bool) {
    if app.now_playing.is_none() {
        return;
    }
    let step = services.settings.controls.scrub_seconds as f64;
    let target = if forward {
        app.position + step
    } else {
        (app.position - step).max(0.0)
    };
    send(PlayerCmd::Seek(target), app, services);
}

fn run_search(app: &mut App, services: &mut Services<'_>) {
    let Some(query) = app.take_search_query() else {
        return;
    };
    let tracks = match &app.folder {
        Some(folder) => services.library.search_tracks(folder, &query),
        None => services.library.global_search(&query),
    };
    if tracks.is_empty() {
        app.set_status(format!("no matches for {query:?}"));
        return;
    }
    info!(%query, hits = tracks.len(), "search replaces queue");
    app.set_status(format!("{} matches for {query:?}", tracks.len()));
    app.follow_playback_on();
    send(
        PlayerCmd::LoadQueue {
            tracks,
            start_index: 0,
        },
        app,
        services,
    );
}

fn quit(app: &App, services: &Services<'_>) {
    // The last position event can be a tick old; ask the player directly.
    let (current, position) = match services.player.snapshot() {
        Ok(snap) => (snap.current, snap.position),
        Err(_) => (app.now_playing.clone(), app.position),
    };
    if let (Some(folder), Some(track)) = (&app.folder, current) {
        if let Err(e) = services
            .store
            .remember_folder_position(folder, &track.path, position)
        {
            warn!(error = %e, "cannot remember folder position");
        }
    }
    services.player.quit_softly(Duration::from_millis(
        services.settings.audio.quit_fade_out_ms,
    ));
}

/// Returns `true` when the app should exit.
fn handle_key_event(key: KeyEvent, app: &mut App, services: &mut Services<'_>) -> bool {
    if app.search_mode {
        match key.code {
            KeyCode::Esc => app.cancel_search(),
            KeyCode::Backspace => app.pop_search_char(),
            KeyCode::Enter => run_search(app, services),
            KeyCode::Char(c) => {
                if !c.is_control() {
                    app.push_search_char(c);
                }
            }
            _ => {}
        }
        return false;
    }

    app.status = None;
    match key.code {
        KeyCode::Char('q') => {
            quit(app, services);
            return true;
        }
        KeyCode::Char('/') => app.enter_search_mode(),
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Enter => play_selected(app, services),
        KeyCode::Char(' ') => match app.transport {
            TransportState::Playing | TransportState::Paused => {
                app.follow_playback_on();
                send(PlayerCmd::TogglePlayPause, app, services);
            }
            TransportState::Stopped | TransportState::Error => play_selected(app, services),
        },
        KeyCode::Char('S') => {
            app.follow_playback_on();
            send(PlayerCmd::Stop, app, services);
        }
        KeyCode::Char('l') => {
            if app.has_tracks() {
                app.follow_playback_on();
                send(PlayerCmd::Next, app, services);
            }
        }
        KeyCode::Char('h') => {
            if app.has_tracks() {
                app.follow_playback_on();
                send(PlayerCmd::Previous, app, services);
            }
        }
        KeyCode::Char('L') => scrub(app, services, true),
        KeyCode::Char('H') => scrub(app, services, false),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let v = app.playback.volume + services.settings.controls.volume_step;
            change_setting(PlayerCmd::SetVolume(v.min(1.0)), app, services);
        }
        KeyCode::Char('-') => {
            let v = app.playback.volume - services.settings.controls.volume_step;
            change_setting(PlayerCmd::SetVolume(v.max(0.0)), app, services);
        }
        KeyCode::Char('m') => change_setting(PlayerCmd::ToggleMute, app, services),
        KeyCode::Char('s') => {
            let on = !app.playback.shuffle;
            change_setting(PlayerCmd::SetShuffle(on), app, services);
        }
        KeyCode::Char('r') => {
            let mode = app.playback.repeat_mode.cycle();
            change_setting(PlayerCmd::SetRepeatMode(mode), app, services);
        }
        KeyCode::Char('c') => {
            let secs = app::next_crossfade(app.playback.crossfade_seconds);
            change_setting(PlayerCmd::SetCrossfade(secs), app, services);
        }
        KeyCode::Char('n') => {
            let on = !app.playback.normalization;
            change_setting(PlayerCmd::SetNormalization(on), app, services);
        }
        KeyCode::Char('e') => {
            let preset = Preset::from_name(&app.playback.preset).cycle();
            change_setting(
                PlayerCmd::SetShapingPreset(preset.name().to_string()),
                app,
                services,
            );
        }
        KeyCode::Char('a') => {
            if let Some(track) = app.selected_track().cloned() {
                app.set_status(format!("playing next: {}", track.display));
                send(PlayerCmd::EnqueueNext(track), app, services);
            }
        }
        KeyCode::Char('x') => {
            if let Some(track) = app.selected_track().cloned() {
                send(PlayerCmd::RemoveFromQueue(track.path), app, services);
            }
        }
        KeyCode::Char('C') => {
            let removed = services.shaping.clear_cache();
            app.set_status(format!(
                "removed {removed} cached renders from {}",
                services.shaping.dir().display()
            ));
        }
        KeyCode::Char('o') => {
            folders::open_next(app, services.library, services.store, services.player);
        }
        KeyCode::Char('R') => {
            folders::rescan(app, services.library, services.store, services.player);
        }
        KeyCode::Char('p') => folders::toggle_pin(app, services.store),
        KeyCode::Char('F') => folders::forget_position(app, services.store),
        KeyCode::Char('D') => folders::forget_folder(app, services.library),
        _ => {}
    }

    false
}
