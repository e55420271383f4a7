//! Play queue with a cursor.
//!
//! The queue is the single authority for "where are we": the cursor always
//! points at the current track when there is one. Reordering operations keep
//! the cursor on the same track, not the same index.

use std::path::Path;

use crate::library::Track;

use super::types::RepeatMode;

#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    cursor: Option<usize>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents, keeping the first occurrence of each path.
    /// The cursor is cleared.
    pub fn replace(&mut self, tracks: Vec<Track>) {
        let mut unique: Vec<Track> = Vec::with_capacity(tracks.len());
        for t in tracks {
            if !unique.iter().any(|u| u.path == t.path) {
                unique.push(t);
            }
        }
        self.tracks = unique;
        self.cursor = None;
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|i| self.tracks.get(i))
    }

    pub fn set_cursor(&mut self, cursor: Option<usize>) {
        self.cursor = cursor.filter(|&i| i < self.tracks.len());
    }

    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.tracks.iter().position(|t| t.path == path)
    }

    /// Point the cursor at `track`, appending it first when absent.
    /// Returns true when the queue grew.
    pub fn select(&mut self, track: &Track) -> bool {
        match self.position_of(&track.path) {
            Some(i) => {
                self.cursor = Some(i);
                false
            }
            None => {
                self.tracks.push(track.clone());
                self.cursor = Some(self.tracks.len() - 1);
                true
            }
        }
    }

    /// Run `f` on the track list and re-find the current track afterwards.
    fn reorder(&mut self, f: impl FnOnce(&mut Vec<Track>)) {
        let current = self.current().map(|t| t.path.clone());
        f(&mut self.tracks);
        self.cursor = current.and_then(|p| self.position_of(&p));
    }

    /// Move or insert `track` right after the current entry. With no current
    /// entry it goes to the front and becomes current.
    pub fn insert_next(&mut self, track: Track) {
        if self.cursor.is_none() {
            self.tracks.retain(|t| t.path != track.path);
            self.tracks.insert(0, track);
            self.cursor = Some(0);
            return;
        }
        self.reorder(|tracks| tracks.retain(|t| t.path != track.path));
        let at = self.cursor.map_or(0, |c| c + 1);
        self.tracks.insert(at, track);
    }

    /// Move or append `track` to the end.
    pub fn append(&mut self, track: Track) {
        self.reorder(|tracks| {
            tracks.retain(|t| t.path != track.path);
            tracks.push(track);
        });
    }

    /// Remove `path`. Returns false when it was not queued. Removing the
    /// current entry clears the cursor.
    pub fn remove(&mut self, path: &Path) -> bool {
        let Some(i) = self.position_of(path) else {
            return false;
        };
        self.reorder(|tracks| {
            tracks.remove(i);
        });
        true
    }

    /// Linear successor of the cursor; `None` means "stop".
    pub fn next_index(&self, repeat: RepeatMode) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        let next = self.cursor.map_or(0, |c| c + 1);
        if next < self.tracks.len() {
            Some(next)
        } else if repeat == RepeatMode::All {
            Some(0)
        } else {
            None
        }
    }

    /// Linear predecessor of the cursor: wraps with repeat=all, else clamps.
    pub fn previous_index(&self, repeat: RepeatMode) -> Option<usize> {
        if self.tracks.is_empty() {
            return None;
        }
        match self.cursor {
            Some(c) if c > 0 => Some(c - 1),
            _ if repeat == RepeatMode::All => Some(self.tracks.len() - 1),
            _ => Some(0),
        }
    }
}
