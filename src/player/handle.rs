//! The player thread and the handle used to talk to it.
//!
//! The controller lives on its own thread. Commands arrive over a channel;
//! when none arrives within the tick interval the loop runs
//! [`Controller::tick`]. Both paths run on the same thread, one at a time.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, warn};

use crate::audio::OutputDevice;
use crate::config::AudioSettings;
use crate::shaping::ShapingCache;
use crate::store::SettingsStore;

use super::controller::Controller;
use super::types::{PlayerCmd, PlayerError, PlayerEvent, Snapshot};

type Reply<T> = Sender<T>;

enum Request {
    Cmd(PlayerCmd, Option<Reply<Result<(), PlayerError>>>),
    Snapshot(Reply<Snapshot>),
    Quit { fade_out: Duration },
}

pub struct PlayerHandle {
    tx: Sender<Request>,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerHandle {
    /// Start the player thread.
    ///
    /// `make_device` runs on the player thread, so the device itself does not
    /// need to be `Send`.
    pub fn spawn<F>(
        make_device: F,
        store: Arc<SettingsStore>,
        shaping: ShapingCache,
        events: Sender<PlayerEvent>,
        audio: &AudioSettings,
    ) -> Self
    where
        F: FnOnce() -> Box<dyn OutputDevice> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Request>();
        let tick = Duration::from_millis(audio.tick_interval_ms.max(1));

        let join = thread::spawn(move || {
            let controller = Controller::new(
                make_device(),
                store,
                shaping,
                events,
                StdRng::from_os_rng(),
            );
            run(controller, rx, tick);
        });

        Self {
            tx,
            join: Mutex::new(Some(join)),
        }
    }

    /// Fire and forget. Failures are logged by the player thread.
    pub fn send(&self, cmd: PlayerCmd) -> Result<(), PlayerError> {
        self.tx
            .send(Request::Cmd(cmd, None))
            .map_err(|_| PlayerError::Disconnected)
    }

    /// Run `cmd` and wait for its outcome.
    pub fn request(&self, cmd: PlayerCmd) -> Result<(), PlayerError> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(Request::Cmd(cmd, Some(reply)))
            .map_err(|_| PlayerError::Disconnected)?;
        rx.recv().map_err(|_| PlayerError::Disconnected)?
    }

    pub fn snapshot(&self) -> Result<Snapshot, PlayerError> {
        let (reply, rx) = mpsc::channel();
        self.tx
            .send(Request::Snapshot(reply))
            .map_err(|_| PlayerError::Disconnected)?;
        rx.recv().map_err(|_| PlayerError::Disconnected)
    }

    /// Fade out over `fade_out`, persist the position and join the thread.
    pub fn quit_softly(&self, fade_out: Duration) {
        let _ = self.tx.send(Request::Quit { fade_out });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

fn run(mut controller: Controller, rx: Receiver<Request>, tick: Duration) {
    let mut next_tick = Instant::now() + tick;
    loop {
        let wait = next_tick.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok(Request::Cmd(cmd, reply)) => {
                debug!(?cmd, "player command");
                let result = controller.apply(cmd);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!(error = %e, "player command failed");
                        }
                    }
                }
            }
            Ok(Request::Snapshot(reply)) => {
                let _ = reply.send(controller.snapshot());
            }
            Ok(Request::Quit { fade_out }) => {
                controller.shutdown(fade_out);
                // The fade runs on the device; keep the output open until it is done.
                thread::sleep(fade_out);
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                controller.tick();
                next_tick = Instant::now() + tick;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}
