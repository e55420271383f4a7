use crate::config;

/// Load configuration, falling back to defaults on any problem.
///
/// Logging is configured from these settings, so a problem is handed back
/// for the caller to log once the subscriber is installed.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("localify: invalid config, using defaults: {msg}");
                (config::Settings::default(), Some(msg))
            } else {
                (s, None)
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("localify: failed to load config, using defaults: {e}");
            (config::Settings::default(), Some(e.to_string()))
        }
    }
}
