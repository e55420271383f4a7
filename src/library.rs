//! Library index: folder scanning, metadata extraction and track search.
//!
//! Tracks are discovered under a folder, enriched with tag metadata and kept
//! in a per-folder cache so repeated lookups do not rescan the disk.

mod index;
mod metadata;
mod model;
mod scan;

pub use index::Library;
pub use model::{Playlist, Track};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{0} is not a readable directory")]
    NotADirectory(PathBuf),
}
