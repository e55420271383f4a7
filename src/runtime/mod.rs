use std::env;
use std::sync::{Arc, mpsc};

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{OutputDevice, RodioOutput};
use crate::library::Library;
use crate::player::{PlayerEvent, PlayerHandle};
use crate::shaping::ShapingCache;
use crate::store::SettingsStore;

mod event_loop;
mod folders;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_problem) = settings::load_settings();
    logging::init(&settings.logging);
    if let Some(msg) = config_problem {
        warn!(%msg, "configuration ignored, using defaults");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let store = Arc::new(SettingsStore::open(settings.store_path())?);
    info!(path = %store.path().display(), "settings store opened");
    let mut library = Library::new(settings.library.clone(), Arc::clone(&store));

    let folder = startup::resolve_folder(env::args().nth(1), store.last_opened_folder());
    let playlist = startup::open_folder(&mut library, &folder);

    let shaping = ShapingCache::new(settings.shaping.resolved_cache_dir());
    let (events_tx, events_rx) = mpsc::channel::<PlayerEvent>();
    let player = PlayerHandle::spawn(
        || Box::new(RodioOutput::new()) as Box<dyn OutputDevice>,
        Arc::clone(&store),
        shaping.clone(),
        events_tx,
        &settings.audio,
    );

    let mut app = App::new(store.playback_state());
    app.set_folder(&playlist);
    app.pinned = store.pinned_folders().contains(&playlist.path);
    startup::load_initial_queue(&player, &store, &playlist);

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut services = event_loop::Services {
            settings: &settings,
            player: &player,
            events: &events_rx,
            store: &store,
            library: &mut library,
            shaping: &shaping,
        };
        event_loop::run(&mut terminal, &mut app, &mut services)
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("bye");
    run_result
}
