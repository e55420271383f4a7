//! Scripted in-memory device for hardware-free tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::{DeviceError, OutputDevice};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init,
    Load(PathBuf),
    Play { start_at: Duration, fade_in: Duration },
    Pause,
    Resume,
    Stop,
    FadeOut(Duration),
    SetVolume(f32),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    initialized: bool,
    busy: bool,
    elapsed: Duration,
    volume: f32,
    loaded: Option<PathBuf>,
    fail_init: bool,
    fail_play: bool,
    failing_paths: HashSet<PathBuf>,
}

/// Cloneable handle: the test keeps one clone while the player owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeDevice {
    state: Arc<Mutex<State>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Loads recorded since the last `clear_calls`.
    pub fn loads(&self) -> Vec<PathBuf> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Load(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_play(&self) -> Option<(Duration, Duration)> {
        self.state().calls.iter().rev().find_map(|c| match c {
            Call::Play { start_at, fade_in } => Some((*start_at, *fade_in)),
            _ => None,
        })
    }

    pub fn volume(&self) -> f32 {
        self.state().volume
    }

    pub fn busy(&self) -> bool {
        self.state().busy
    }

    pub fn set_busy(&self, busy: bool) {
        self.state().busy = busy;
    }

    pub fn set_elapsed(&self, elapsed: Duration) {
        self.state().elapsed = elapsed;
    }

    pub fn fail_init(&self, fail: bool) {
        self.state().fail_init = fail;
    }

    pub fn fail_play(&self, fail: bool) {
        self.state().fail_play = fail;
    }

    pub fn fail_load(&self, path: &Path) {
        self.state().failing_paths.insert(path.to_path_buf());
    }
}

impl OutputDevice for FakeDevice {
    fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    fn ensure_initialized(&mut self) -> Result<(), DeviceError> {
        let mut s = self.state();
        if s.initialized {
            return Ok(());
        }
        if s.fail_init {
            return Err(DeviceError::Unavailable("scripted".into()));
        }
        s.initialized = true;
        s.calls.push(Call::Init);
        Ok(())
    }

    fn load(&mut self, path: &Path) -> Result<(), DeviceError> {
        let mut s = self.state();
        s.calls.push(Call::Load(path.to_path_buf()));
        if s.failing_paths.contains(path) {
            return Err(DeviceError::Decode {
                path: path.to_path_buf(),
                reason: "scripted".into(),
            });
        }
        s.loaded = Some(path.to_path_buf());
        Ok(())
    }

    fn play(&mut self, start_at: Duration, fade_in: Duration) -> Result<(), DeviceError> {
        let mut s = self.state();
        s.calls.push(Call::Play { start_at, fade_in });
        if s.fail_play {
            return Err(DeviceError::Unavailable("scripted".into()));
        }
        if s.loaded.is_none() {
            return Err(DeviceError::NothingLoaded);
        }
        s.busy = true;
        s.elapsed = Duration::ZERO;
        Ok(())
    }

    fn pause(&mut self) {
        let mut s = self.state();
        s.calls.push(Call::Pause);
        s.busy = false;
    }

    fn resume(&mut self) {
        let mut s = self.state();
        s.calls.push(Call::Resume);
        s.busy = s.loaded.is_some();
    }

    fn stop(&mut self) {
        let mut s = self.state();
        s.calls.push(Call::Stop);
        s.busy = false;
        s.elapsed = Duration::ZERO;
    }

    fn fade_out(&mut self, duration: Duration) {
        let mut s = self.state();
        s.calls.push(Call::FadeOut(duration));
        s.busy = false;
        s.elapsed = Duration::ZERO;
    }

    fn elapsed(&self) -> Duration {
        self.state().elapsed
    }

    fn is_busy(&self) -> bool {
        self.state().busy
    }

    fn set_volume(&mut self, volume: f32) {
        let mut s = self.state();
        s.calls.push(Call::SetVolume(volume));
        s.volume = volume;
    }
}
