use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::ShapingError;
use super::preset::Preset;
use super::render;

/// Memoizes shaped renditions of source files on disk.
#[derive(Debug, Clone)]
pub struct ShapingCache {
    dir: PathBuf,
}

impl ShapingCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path that plays `source` with `preset_name` applied.
    ///
    /// Identity and unknown presets return `source` unchanged, and so does
    /// any failure to build the rendition.
    pub fn prepare(&self, source: &Path, preset_name: &str) -> PathBuf {
        let preset = Preset::from_name(preset_name);
        if preset.is_identity() {
            return source.to_path_buf();
        }

        match self.try_prepare(source, preset) {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    source = %source.display(),
                    preset = preset.name(),
                    error = %e,
                    "shaping failed, playing the original"
                );
                source.to_path_buf()
            }
        }
    }

    fn try_prepare(&self, source: &Path, preset: Preset) -> Result<PathBuf, ShapingError> {
        let source_modified = fs::metadata(source)?.modified()?;
        let artifact = self.dir.join(format!("{}.wav", cache_key(source, preset)?));

        let fresh = fs::metadata(&artifact)
            .and_then(|m| m.modified())
            .is_ok_and(|cached| cached >= source_modified);
        if fresh {
            debug!(artifact = %artifact.display(), "shaping cache hit");
            return Ok(artifact);
        }

        fs::create_dir_all(&self.dir)?;
        render::render(source, &artifact, preset)?;
        debug!(
            source = %source.display(),
            artifact = %artifact.display(),
            preset = preset.name(),
            "rendered shaped track"
        );
        Ok(artifact)
    }

    /// Best-effort removal of every cached artifact. Returns how many files
    /// were removed.
    pub fn clear_cache(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => debug!(path = %path.display(), error = %e, "cannot remove cached file"),
            }
        }
        removed
    }
}

/// Fingerprint of `source` (absolute path and mtime) together with `preset`.
pub(super) fn cache_key(source: &Path, preset: Preset) -> Result<String, ShapingError> {
    let resolved = fs::canonicalize(source)?;
    let modified = fs::metadata(&resolved)?
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    let signature = format!("{}::{}::{}", resolved.display(), modified, preset.name());
    Ok(hex::encode(Sha256::digest(signature.as_bytes())))
}
