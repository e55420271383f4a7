//! `rodio`-backed output device.
//!
//! Every `play` builds a fresh `Sink` on the default output stream, with the
//! decoder skipped to the requested offset. Fading out moves the current
//! sink to a short-lived helper thread so the caller never waits on it.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::{debug, info};

use super::{DeviceError, OutputDevice};

type FileDecoder = Decoder<BufReader<File>>;

pub struct RodioOutput {
    stream: Option<OutputStream>,
    loaded: Option<PathBuf>,
    staged: Option<FileDecoder>,
    sink: Option<Sink>,
    volume: f32,
    // Elapsed bookkeeping: time since the last (re)start plus what was
    // played before the last pause.
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl RodioOutput {
    pub fn new() -> Self {
        Self {
            stream: None,
            loaded: None,
            staged: None,
            sink: None,
            volume: 1.0,
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    fn open_decoder(path: &Path) -> Result<FileDecoder, DeviceError> {
        let file = File::open(path).map_err(|source| DeviceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Decoder::new(BufReader::new(file)).map_err(|e| DeviceError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn reset_clock(&mut self) {
        self.started_at = None;
        self.accumulated = Duration::ZERO;
    }
}

impl Default for RodioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDevice for RodioOutput {
    fn is_initialized(&self) -> bool {
        self.stream.is_some()
    }

    fn ensure_initialized(&mut self) -> Result<(), DeviceError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which garbles the TUI.
        stream.log_on_drop(false);
        info!("audio output opened");
        self.stream = Some(stream);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<(), DeviceError> {
        let decoder = Self::open_decoder(path)?;
        self.loaded = Some(path.to_path_buf());
        self.staged = Some(decoder);
        Ok(())
    }

    fn play(&mut self, start_at: Duration, fade_in: Duration) -> Result<(), DeviceError> {
        let Some(stream) = self.stream.as_ref() else {
            return Err(DeviceError::Unavailable("output not initialized".into()));
        };
        let decoder = match self.staged.take() {
            Some(d) => d,
            None => {
                let path = self.loaded.as_deref().ok_or(DeviceError::NothingLoaded)?;
                Self::open_decoder(path)?
            }
        };

        // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
        let source = decoder.skip_duration(start_at).fade_in(fade_in);
        let sink = Sink::connect_new(stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);

        if let Some(old) = self.sink.replace(sink) {
            old.stop();
        }
        self.accumulated = Duration::ZERO;
        self.started_at = Some(Instant::now());
        debug!(path = ?self.loaded, ?start_at, ?fade_in, "sink started");
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
            if let Some(st) = self.started_at.take() {
                self.accumulated += st.elapsed();
            }
        }
    }

    fn resume(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.play();
            if self.started_at.is_none() {
                self.started_at = Some(Instant::now());
            }
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.reset_clock();
    }

    fn fade_out(&mut self, duration: Duration) {
        let Some(sink) = self.sink.take() else {
            return;
        };
        self.reset_clock();
        let from = sink.volume();
        thread::spawn(move || {
            fade_out_sink(&sink, from, duration);
            sink.stop();
        });
    }

    fn elapsed(&self) -> Duration {
        if self.sink.is_none() {
            return Duration::ZERO;
        }
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }

    fn is_busy(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| !s.empty() && !s.is_paused())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(self.volume);
        }
    }
}

/// Step `sink` from `from` down to silence over `duration`.
fn fade_out_sink(sink: &Sink, from: f32, duration: Duration) {
    if duration.is_zero() {
        sink.set_volume(0.0);
        return;
    }
    let steps: u32 = 20;
    let step = (duration / steps).max(Duration::from_millis(1));
    for i in 1..=steps {
        let t = i as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(step);
    }
    sink.set_volume(0.0);
}
