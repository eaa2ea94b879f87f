//! Queue engine
//!
//! Owns the play queue, the cursor, and the shuffle/repeat state.
//!
//! ```text
//!            cursor
//!              v
//! queue:  [A]  [B]  [C]  [D]
//!          ^    ^    ^^^^^^^
//!    history  current  upcoming (clear_queue drops these)
//! ```
//!
//! When shuffled, `old_queue` holds the pre-shuffle order. Tracks added or
//! removed during the shuffled session are mirrored into it so that
//! un-shuffling restores the original order with those edits applied.
//!
//! Every entry carries a key shared with its pre-shuffle counterpart, so
//! mirroring and un-shuffling never confuse two entries of the same track.

use crate::error::{PlaybackError, Result};
use crate::shuffle::shuffle_around;
use cadence_core::{PersistedPlayerState, PlayerStatus, RepeatMode, Track, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

/// Where navigation should go next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Play the track at this queue index
    To(usize),
    /// Navigation ran past the end of the queue
    Stop,
}

/// Queue state machine
#[derive(Debug, Clone)]
pub struct QueueEngine {
    /// Tracks in playback order
    queue: Vec<Track>,
    keys: Vec<u64>,

    /// Pre-shuffle order
    old_queue: Vec<Track>,
    old_keys: Vec<u64>,

    /// Index of the current track, `None` when there is no active queue
    cursor: Option<usize>,

    shuffle: bool,
    repeat: RepeatMode,

    /// View the queue was started from
    origin: Option<String>,

    next_key: u64,
    rng: StdRng,
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl QueueEngine {
    /// Create an empty queue using `rng` for shuffling
    pub fn new(rng: StdRng) -> Self {
        Self {
            queue: Vec::new(),
            keys: Vec::new(),
            old_queue: Vec::new(),
            old_keys: Vec::new(),
            cursor: None,
            shuffle: false,
            repeat: RepeatMode::None,
            origin: None,
            next_key: 0,
            rng,
        }
    }

    /// Create an empty queue with a deterministic shuffle
    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    // ===== Accessors =====

    /// Tracks in playback order
    pub fn tracks(&self) -> &[Track] {
        &self.queue
    }

    /// Pre-shuffle order
    pub fn old_tracks(&self) -> &[Track] {
        &self.old_queue
    }

    /// Index of the current track
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Track at the cursor
    pub fn current(&self) -> Option<&Track> {
        self.cursor.and_then(|c| self.queue.get(c))
    }

    /// Track at `index`
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.queue.get(index)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// View the queue was started from
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    // ===== Building =====

    /// Replace the queue wholesale
    ///
    /// The cursor is kept when it still indexes into the new queue, clamped to
    /// the last index otherwise, and cleared when the new queue is empty.
    pub fn set_queue(&mut self, tracks: Vec<Track>) {
        self.queue = tracks;
        self.keys = self.linked_keys();
        self.cursor = match self.cursor {
            Some(_) if self.queue.is_empty() => None,
            Some(c) => Some(c.min(self.queue.len() - 1)),
            None => None,
        };
    }

    /// Find the index `start` should begin at
    ///
    /// `track_id` defaults to the first candidate.
    pub fn resolve_start(candidates: &[Track], track_id: Option<&TrackId>) -> Result<usize> {
        let first = candidates.first().ok_or(PlaybackError::EmptyCandidates)?;
        let wanted = track_id.unwrap_or(&first.id);

        candidates
            .iter()
            .position(|t| &t.id == wanted)
            .ok_or_else(|| PlaybackError::TrackNotFound(wanted.clone()))
    }

    /// Build a new queue from `candidates`, starting at `position`
    ///
    /// The candidates are kept as `old_queue`. When shuffle is on, the queue is
    /// shuffled with the starting track pinned first. Returns the new cursor.
    pub fn start(
        &mut self,
        candidates: Vec<Track>,
        position: usize,
        origin: Option<String>,
    ) -> Result<usize> {
        if position >= candidates.len() {
            return Err(PlaybackError::IndexOutOfBounds(position));
        }

        let keys = self.fresh_keys(candidates.len());
        let identity: Vec<usize> = (0..candidates.len()).collect();
        let (order, cursor) = if self.shuffle {
            (shuffle_around(&identity, position, &mut self.rng), 0)
        } else {
            (identity, position)
        };

        (self.queue, self.keys) = reorder(&candidates, &keys, &order);
        self.old_queue = candidates;
        self.old_keys = keys;
        self.cursor = Some(cursor);
        self.origin = origin;

        Ok(cursor)
    }

    /// Restore a previously persisted queue
    ///
    /// An out-of-range cursor is discarded. Entries are paired with the
    /// pre-shuffle order by occurrence: the n-th copy of a track in `queue`
    /// matches its n-th copy in `old_queue`.
    pub fn restore(
        &mut self,
        queue: Vec<Track>,
        old_queue: Vec<Track>,
        cursor: Option<usize>,
        origin: Option<String>,
    ) {
        self.cursor = cursor.filter(|c| *c < queue.len());
        self.old_keys = self.fresh_keys(old_queue.len());
        self.old_queue = old_queue;
        self.queue = queue;
        self.keys = self.linked_keys();
        self.origin = origin;
    }

    /// Drop the queue entirely (stop)
    pub fn clear(&mut self) {
        self.queue.clear();
        self.keys.clear();
        self.old_queue.clear();
        self.old_keys.clear();
        self.cursor = None;
        self.origin = None;
    }

    /// Snapshot for persistence
    pub fn to_persisted(&self, status: PlayerStatus) -> PersistedPlayerState {
        PersistedPlayerState {
            queue: self.queue.iter().map(|t| t.id.clone()).collect(),
            old_queue: self.old_queue.iter().map(|t| t.id.clone()).collect(),
            cursor: self.cursor,
            status,
            origin: self.origin.clone(),
        }
    }

    // ===== Navigation =====

    /// Move the cursor to `index`
    pub fn set_cursor(&mut self, index: usize) -> Result<()> {
        if index >= self.queue.len() {
            return Err(PlaybackError::IndexOutOfBounds(index));
        }
        self.cursor = Some(index);
        Ok(())
    }

    /// Where `next` goes under the current repeat mode
    ///
    /// - `One`: the current index
    /// - `All` on the last index: wraps to 0
    /// - otherwise: the following index, or [`Step::Stop`] past the end
    pub fn next_step(&self) -> Result<Step> {
        let cursor = self.cursor.ok_or(PlaybackError::NoActiveQueue)?;

        let target = match self.repeat {
            RepeatMode::One => cursor,
            RepeatMode::All if cursor + 1 == self.queue.len() => 0,
            _ => cursor + 1,
        };

        Ok(if target < self.queue.len() {
            Step::To(target)
        } else {
            Step::Stop
        })
    }

    /// Where `previous` goes
    ///
    /// Goes back a track when less than `threshold` of the current track has
    /// played, restarts it otherwise. Going back from the first track stops.
    pub fn previous_step(&self, elapsed: Duration, threshold: Duration) -> Result<Step> {
        let cursor = self.cursor.ok_or(PlaybackError::NoActiveQueue)?;

        if elapsed >= threshold {
            return Ok(Step::To(cursor));
        }

        Ok(cursor.checked_sub(1).map_or(Step::Stop, Step::To))
    }

    // ===== Shuffle / repeat =====

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    /// Set the shuffle flag without touching the queue
    ///
    /// Used when applying stored settings before a queue exists.
    pub fn set_shuffle_flag(&mut self, enabled: bool) {
        self.shuffle = enabled;
    }

    /// Enable or disable shuffle
    ///
    /// With an active queue this reorders it (see [`Self::shuffle_on`] and
    /// [`Self::unshuffle`]); otherwise only the flag changes. Setting the
    /// current value again does nothing.
    pub fn set_shuffle(&mut self, enabled: bool) {
        if enabled == self.shuffle {
            return;
        }

        let transformed = if enabled {
            self.shuffle_on()
        } else {
            self.unshuffle()
        };

        if transformed.is_err() {
            self.shuffle = enabled;
        }
    }

    /// Shuffle the queue around the current track
    ///
    /// The current track moves to index 0 and keeps playing; the previous
    /// order is saved as `old_queue`.
    pub fn shuffle_on(&mut self) -> Result<()> {
        let cursor = self.cursor.ok_or(PlaybackError::NoActiveQueue)?;

        let identity: Vec<usize> = (0..self.queue.len()).collect();
        let order = shuffle_around(&identity, cursor, &mut self.rng);
        let (queue, keys) = reorder(&self.queue, &self.keys, &order);

        self.old_queue = std::mem::replace(&mut self.queue, queue);
        self.old_keys = std::mem::replace(&mut self.keys, keys);
        self.cursor = Some(0);
        self.shuffle = true;

        Ok(())
    }

    /// Restore the pre-shuffle order
    ///
    /// The cursor follows the playing entry. If that entry is no longer in
    /// `old_queue`, the cursor is clamped to the last index; an empty restored
    /// queue clears the cursor.
    pub fn unshuffle(&mut self) -> Result<()> {
        let cursor = self.cursor.ok_or(PlaybackError::NoActiveQueue)?;

        let relocated = self
            .keys
            .get(cursor)
            .and_then(|playing| self.old_keys.iter().position(|k| k == playing));

        self.queue = self.old_queue.clone();
        self.keys = self.old_keys.clone();
        self.cursor = match relocated {
            Some(index) => Some(index),
            None => self.queue.len().checked_sub(1),
        };
        self.shuffle = false;

        Ok(())
    }

    // ===== Editing =====

    /// Drop every track after the cursor
    ///
    /// Returns the number of tracks removed.
    pub fn clear_queue(&mut self) -> Result<usize> {
        let cursor = self.cursor.ok_or(PlaybackError::NoActiveQueue)?;

        let removed = self.queue.split_off(cursor + 1).len();
        let dropped: HashSet<u64> = self.keys.split_off(cursor + 1).into_iter().collect();

        if self.shuffle {
            let (old_queue, old_keys) = std::mem::take(&mut self.old_queue)
                .into_iter()
                .zip(std::mem::take(&mut self.old_keys))
                .filter(|(_, key)| !dropped.contains(key))
                .unzip();
            self.old_queue = old_queue;
            self.old_keys = old_keys;
        }

        Ok(removed)
    }

    /// Remove an upcoming track
    ///
    /// `index` is relative to the cursor: 0 is the next track.
    pub fn remove_from_queue(&mut self, index: usize) -> Result<Track> {
        let cursor = self.cursor.ok_or(PlaybackError::NoActiveQueue)?;

        let position = cursor
            .checked_add(index)
            .and_then(|p| p.checked_add(1))
            .filter(|p| *p < self.queue.len())
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;

        let track = self.queue.remove(position);
        let key = self.keys.remove(position);
        if self.shuffle {
            if let Some(pos) = self.old_keys.iter().position(|k| *k == key) {
                self.old_queue.remove(pos);
                self.old_keys.remove(pos);
            }
        }

        Ok(track)
    }

    /// Append tracks to the end of the queue
    ///
    /// Returns `true` when this armed a queue that had no cursor: the cursor
    /// is then set to 0 without starting playback.
    pub fn add_in_queue(&mut self, tracks: Vec<Track>) -> bool {
        if tracks.is_empty() {
            return false;
        }

        let keys = self.fresh_keys(tracks.len());
        if self.shuffle {
            self.old_queue.extend(tracks.iter().cloned());
            self.old_keys.extend(&keys);
        }
        self.queue.extend(tracks);
        self.keys.extend(keys);

        self.arm()
    }

    /// Insert tracks right after the cursor
    ///
    /// Without a cursor the tracks go to the front of the queue and the cursor
    /// is set to 0. Returns `true` when this armed the queue.
    pub fn add_next_in_queue(&mut self, tracks: Vec<Track>) -> bool {
        if tracks.is_empty() {
            return false;
        }

        let insert_at = self.cursor.map_or(0, |c| c + 1);
        let keys = self.fresh_keys(tracks.len());

        if self.shuffle {
            let old_insert_at = self
                .cursor
                .and_then(|c| self.keys.get(c))
                .and_then(|playing| self.old_keys.iter().position(|k| k == playing))
                .map_or(self.old_queue.len(), |p| p + 1);
            self.old_queue
                .splice(old_insert_at..old_insert_at, tracks.iter().cloned());
            self.old_keys
                .splice(old_insert_at..old_insert_at, keys.iter().copied());
        }
        self.queue.splice(insert_at..insert_at, tracks);
        self.keys.splice(insert_at..insert_at, keys);

        self.arm()
    }

    fn arm(&mut self) -> bool {
        if self.cursor.is_some() || self.queue.is_empty() {
            return false;
        }
        self.cursor = Some(0);
        true
    }

    fn fresh_keys(&mut self, count: usize) -> Vec<u64> {
        let first = self.next_key;
        self.next_key += count as u64;
        (first..self.next_key).collect()
    }

    /// Keys for `queue`, shared with the matching `old_queue` entries
    fn linked_keys(&mut self) -> Vec<u64> {
        let mut unmatched: HashMap<&TrackId, VecDeque<u64>> = HashMap::new();
        for (track, key) in self.old_queue.iter().zip(&self.old_keys) {
            unmatched.entry(&track.id).or_default().push_back(*key);
        }

        let mut keys = Vec::with_capacity(self.queue.len());
        for track in &self.queue {
            let key = match unmatched.get_mut(&track.id).and_then(VecDeque::pop_front) {
                Some(key) => key,
                None => {
                    self.next_key += 1;
                    self.next_key - 1
                }
            };
            keys.push(key);
        }
        keys
    }
}

fn reorder(tracks: &[Track], keys: &[u64], order: &[usize]) -> (Vec<Track>, Vec<u64>) {
    order.iter().map(|&i| (tracks[i].clone(), keys[i])).unzip()
}
