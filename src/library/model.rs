use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A playable file on disk plus the metadata extracted from it.
///
/// Two tracks are equal when they point at the same path, regardless of
/// their tags.
#[derive(Debug, Clone)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Tag-reported length, treated as the authoritative track length.
    pub duration: Duration,
    /// Loudness adjustment in dB (ReplayGain track gain); 0.0 means none.
    pub gain_db: f32,
    pub display: String,
}

impl Track {
    /// Build a track with only a path and a length; the title is the file stem.
    pub fn new(path: impl Into<PathBuf>, duration: Duration) -> Self {
        let path = path.into();
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        Self {
            display: title.clone(),
            path,
            title,
            artist: None,
            album: None,
            duration,
            gain_db: 0.0,
        }
    }

    pub fn with_gain_db(mut self, gain_db: f32) -> Self {
        self.gain_db = gain_db;
        self
    }

    /// Case-insensitive substring match over title, artist, album and path.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let path = self.path.to_string_lossy();
        [
            Some(self.title.as_str()),
            self.artist.as_deref(),
            self.album.as_deref(),
            Some(path.as_ref()),
        ]
        .into_iter()
        .flatten()
        .any(|v| v.to_lowercase().contains(&query))
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// A scanned folder.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub path: PathBuf,
    pub tracks: Vec<Track>,
    pub total_duration: Duration,
    pub subfolders: Vec<PathBuf>,
}

impl Playlist {
    pub fn new(path: &Path, tracks: Vec<Track>, subfolders: Vec<PathBuf>) -> Self {
        let total_duration = tracks.iter().map(|t| t.duration).sum();
        Self {
            path: path.to_path_buf(),
            tracks,
            total_duration,
            subfolders,
        }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }
}
