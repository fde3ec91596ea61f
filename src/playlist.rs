//! Asset selection shared by every track.
//!
//! Tracks only see [`AssetSource`]. [`Playlist`] is the in-process
//! implementation: it owns the global play history and serializes
//! concurrent `next` calls behind a mutex.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use rand::seq::SliceRandom;
use tracing::debug;

use crate::library::{Asset, AssetId};
use crate::track::TrackId;

/// Who is asking for an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetRequest {
    pub track: TrackId,
    pub repeat_recordings: bool,
}

/// Provides the next asset for a track, or `None` when nothing is eligible.
///
/// Implementations must be safe to call from several track threads at once.
pub trait AssetSource: Send + Sync {
    fn next(&self, request: AssetRequest) -> Option<Asset>;

    /// `track` no longer holds an audible asset (idle or shut down).
    fn release(&self, _track: TrackId) {}
}

#[derive(Debug, Default)]
struct History {
    /// Last time each asset was handed out.
    played: HashMap<AssetId, Instant>,
    /// Asset each track currently holds.
    assigned: HashMap<TrackId, AssetId>,
}

pub struct Playlist {
    assets: Vec<Asset>,
    history: Mutex<History>,
}

impl Playlist {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            assets,
            history: Mutex::new(History::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    fn pick(&self, history: &History, request: AssetRequest) -> Option<usize> {
        let previous = history.assigned.get(&request.track).copied();
        let held_elsewhere = |id: AssetId| {
            history
                .assigned
                .iter()
                .any(|(&track, &held)| track != request.track && held == id)
        };

        let available: Vec<usize> = (0..self.assets.len())
            .filter(|&i| !held_elsewhere(self.assets[i].id))
            .collect();

        let fresh: Vec<usize> = available
            .iter()
            .copied()
            .filter(|&i| !history.played.contains_key(&self.assets[i].id))
            .collect();
        if !fresh.is_empty() {
            return fresh.choose(&mut rand::thread_rng()).copied();
        }
        if !request.repeat_recordings {
            return None;
        }

        // Everything has been heard: replay the stalest asset, avoiding an
        // immediate repeat when there is any alternative.
        let replay: Vec<usize> = if available.len() > 1 {
            available
                .into_iter()
                .filter(|&i| Some(self.assets[i].id) != previous)
                .collect()
        } else {
            available
        };
        replay
            .into_iter()
            .min_by_key(|&i| history.played.get(&self.assets[i].id).copied())
    }
}

impl Playlist {
    fn history(&self) -> MutexGuard<'_, History> {
        match self.history.lock() {
            Ok(h) => h,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl AssetSource for Playlist {
    fn next(&self, request: AssetRequest) -> Option<Asset> {
        let mut history = self.history();

        let Some(i) = self.pick(&history, request) else {
            debug!(track = request.track, "no eligible asset");
            return None;
        };

        let asset = self.assets[i].clone();
        history.played.insert(asset.id, Instant::now());
        history.assigned.insert(request.track, asset.id);
        debug!(track = request.track, asset = asset.id, title = %asset.title, "assigned asset");
        Some(asset)
    }

    fn release(&self, track: TrackId) {
        if let Some(asset) = self.history().assigned.remove(&track) {
            debug!(track, asset, "released asset");
        }
    }
}
