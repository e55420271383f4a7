use std::path::Path;
use std::time::Duration;

use lofty::prelude::*;
use tracing::debug;

/// Tag data extracted from one audio file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Duration,
    /// ReplayGain track gain in dB, when tagged.
    pub gain_db: Option<f32>,
}

fn non_empty(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Parse a ReplayGain value such as `"-6.20 dB"`.
pub(super) fn parse_gain(raw: &str) -> Option<f32> {
    raw.split_whitespace()
        .next()
        .and_then(|v| v.trim_end_matches("dB").parse::<f32>().ok())
        .filter(|v| v.is_finite())
}

/// Read tags and stream properties from `path`.
///
/// Returns `None` when the file cannot be parsed; callers keep scanning.
pub fn extract(path: &Path) -> Option<TrackMetadata> {
    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "metadata unavailable");
            return None;
        }
    };

    let mut meta = TrackMetadata {
        duration: tagged.properties().duration(),
        ..TrackMetadata::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        meta.title = non_empty(tag.title());
        meta.artist = non_empty(tag.artist());
        meta.album = non_empty(tag.album());
        meta.gain_db = tag
            .items()
            .find(|item| matches!(item.key(), ItemKey::ReplayGainTrackGain))
            .and_then(|item| item.value().text())
            .and_then(parse_gain);
    }

    Some(meta)
}
