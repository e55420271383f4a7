//! Track shaping cache.
//!
//! A shaping preset is a small gain/filter transform. Rendering one is
//! expensive, so results are written to a cache directory keyed by the
//! source's location, modification time and the preset name.

mod cache;
mod preset;
mod render;

pub use cache::ShapingCache;
pub use preset::Preset;

use thiserror::Error;

/// Internal failure while producing a shaped rendition.
///
/// Never escapes [`ShapingCache::prepare`]: every variant is logged and the
/// caller gets the untouched source back.
#[derive(Debug, Error)]
pub(crate) enum ShapingError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode source: {0}")]
    Decode(String),
    #[error("cannot write artifact: {0}")]
    Encode(#[from] hound::Error),
    #[error("filter setup failed: {0}")]
    Filter(String),
}

#[cfg(test)]
mod tests;
