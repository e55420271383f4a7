use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_localify_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("LOCALIFY_CONFIG_PATH", "/tmp/localify-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/localify-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("localify")
            .join("config.toml")
    );
}

#[test]
fn store_path_defaults_next_to_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let s = Settings::default();
    assert_eq!(
        s.store_path(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("localify")
            .join("state.toml")
    );
}

#[test]
fn validate_rejects_zero_tick_and_bad_volume_step() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.audio.tick_interval_ms = 0;
    assert!(s.validate().is_err());

    s.audio.tick_interval_ms = 250;
    s.controls.volume_step = 0.0;
    assert!(s.validate().is_err());
    s.controls.volume_step = 1.5;
    assert!(s.validate().is_err());
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
tick_interval_ms = 100
quit_fade_out_ms = 0

[library]
extensions = ["flac"]
recursive = false
include_hidden = false
follow_links = false

[shaping]
cache_dir = "/tmp/localify-shapes"

[store]
path = "/tmp/localify-state.toml"

[controls]
scrub_seconds = 9
volume_step = 0.1

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LOCALIFY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("LOCALIFY__AUDIO__TICK_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.tick_interval_ms, 100);
    assert_eq!(s.audio.quit_fade_out_ms, 0);
    assert_eq!(s.library.extensions, vec!["flac".to_string()]);
    assert!(!s.library.recursive);
    assert!(!s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(
        s.shaping.resolved_cache_dir(),
        std::path::PathBuf::from("/tmp/localify-shapes")
    );
    assert_eq!(
        s.store_path(),
        std::path::PathBuf::from("/tmp/localify-state.toml")
    );
    assert_eq!(s.controls.scrub_seconds, 9);
    assert_eq!(s.controls.volume_step, 0.1);
    assert_eq!(s.logging.level, "debug");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
tick_interval_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("LOCALIFY_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("LOCALIFY__AUDIO__TICK_INTERVAL_MS", "50");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.tick_interval_ms, 50);
}
