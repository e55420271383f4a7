use std::collections::VecDeque;

use crate::library::Track;

pub const HISTORY_CAPACITY: usize = 50;

/// Recently started tracks, oldest first. A track appears at most once.
#[derive(Debug, Clone)]
pub struct History {
    tracks: VecDeque<Track>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `track`, dropping an earlier occurrence and then the oldest
    /// entry when over capacity.
    pub fn push(&mut self, track: Track) {
        self.tracks.retain(|t| t.path != track.path);
        self.tracks.push_back(track);
        while self.tracks.len() > self.capacity {
            self.tracks.pop_front();
        }
    }

    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop_back()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn to_vec(&self) -> Vec<Track> {
        self.tracks.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}
