//! Bounded per-object history.

use crate::detection::{Point, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

pub const POSITION_HISTORY: usize = 30;
pub const SPEED_HISTORY: usize = 10;
pub const ACCELERATION_HISTORY: usize = 5;

/// Fixed-capacity FIFO window; pushing past capacity drops the oldest entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> Window<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push_back(item);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.items.back()
    }

    /// The `n` most recent entries, oldest first. Fewer if the window is shorter.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(n);
        self.items.iter().skip(skip)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub positions: Window<Point>,
    pub speeds: Window<f64>,
    pub accelerations: Window<f64>,
    pub lane_change_count: u32,
    pub erratic_count: u32,
}

impl Track {
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            positions: Window::new(POSITION_HISTORY),
            speeds: Window::new(SPEED_HISTORY),
            accelerations: Window::new(ACCELERATION_HISTORY),
            lane_change_count: 0,
            erratic_count: 0,
        }
    }
}

/// One [`Track`] per live id. Tracks are never expired within a session.
#[derive(Debug, Default)]
pub struct TrackStore {
    tracks: HashMap<TrackId, Track>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `center` to the track's positions, creating the track on first sight.
    pub fn update(&mut self, id: TrackId, center: Point) {
        self.upsert(id, center);
    }

    pub(crate) fn upsert(&mut self, id: TrackId, center: Point) -> &mut Track {
        let track = self.tracks.entry(id).or_insert_with(|| Track::new(id));
        track.positions.push(center);
        track
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.keys().copied()
    }
}
