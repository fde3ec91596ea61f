//! Test doubles shared by the engine and session tests.

use std::collections::{HashSet, VecDeque};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::audio::{BackendEvent, PlaybackBackend};
use crate::error::BackendError;
use crate::library::{Asset, AssetId};
use crate::playlist::{AssetRequest, AssetSource};
use crate::track::TrackId;

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub gain: f32,
    /// Front is the audible item.
    pub queue: VecDeque<Asset>,
    pub enqueued: Vec<AssetId>,
    pub advances: usize,
    pub paused: bool,
    pub stopped: bool,
    pub failing: HashSet<AssetId>,
    pub events: Vec<BackendEvent>,
    pub gain_log: Vec<f32>,
}

#[derive(Clone, Default)]
pub(crate) struct MockBackend(Arc<Mutex<MockState>>);

impl MockBackend {
    pub(crate) fn with_current(asset: Asset, gain: f32) -> Self {
        let m = Self::default();
        {
            let mut s = m.0.lock().unwrap();
            s.queue.push_back(asset);
            s.gain = gain;
        }
        m
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    /// Let the audible item run out, as the real player would.
    pub(crate) fn finish_current(&self) {
        let mut s = self.state();
        if let Some(done) = s.queue.pop_front() {
            s.events.push(BackendEvent::Finished(done.id));
            if let Some(next) = s.queue.front().map(|a| a.id) {
                s.events.push(BackendEvent::Started(next));
            }
        }
    }

    /// Like `finish_current`, but the item dies with a playback error.
    pub(crate) fn fail_current(&self, reason: &str) {
        let mut s = self.state();
        if let Some(dead) = s.queue.pop_front() {
            s.events.push(BackendEvent::Error {
                asset: dead.id,
                reason: reason.to_string(),
            });
            if let Some(next) = s.queue.front().map(|a| a.id) {
                s.events.push(BackendEvent::Started(next));
            }
        }
    }
}

impl PlaybackBackend for MockBackend {
    fn enqueue(&mut self, asset: &Asset) -> Result<(), BackendError> {
        let mut s = self.state();
        if s.failing.contains(&asset.id) {
            return Err(BackendError::Open {
                path: asset.path.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "missing"),
            });
        }
        s.enqueued.push(asset.id);
        s.queue.push_back(asset.clone());
        if s.queue.len() == 1 {
            s.events.push(BackendEvent::Started(asset.id));
        }
        Ok(())
    }

    fn gain(&self) -> f32 {
        self.state().gain
    }

    fn set_gain(&mut self, gain: f32) {
        let mut s = self.state();
        s.gain = gain;
        s.gain_log.push(gain);
    }

    fn queue_len(&self) -> usize {
        self.state().queue.len()
    }

    fn current_item_duration(&self) -> Option<Duration> {
        self.state().queue.front().and_then(|a| a.duration)
    }

    fn play(&mut self) {
        self.state().paused = false;
    }

    fn pause(&mut self) {
        self.state().paused = true;
    }

    fn resume(&mut self) {
        self.state().paused = false;
    }

    fn advance_to_next(&mut self) {
        let mut s = self.state();
        s.queue.pop_front();
        s.advances += 1;
    }

    fn stop(&mut self) {
        let mut s = self.state();
        s.queue.clear();
        s.stopped = true;
    }

    fn poll_events(&mut self) -> Vec<BackendEvent> {
        std::mem::take(&mut self.state().events)
    }
}

/// Hands out a fixed sequence of assets, then nothing.
pub(crate) struct ScriptedSource {
    script: Mutex<VecDeque<Asset>>,
    calls: Mutex<usize>,
    releases: Mutex<usize>,
}

impl ScriptedSource {
    pub(crate) fn new(assets: Vec<Asset>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(assets.into()),
            calls: Mutex::new(0),
            releases: Mutex::new(0),
        })
    }

    pub(crate) fn push(&self, asset: Asset) {
        self.script.lock().unwrap().push_back(asset);
    }

    pub(crate) fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    pub(crate) fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub(crate) fn releases(&self) -> usize {
        *self.releases.lock().unwrap()
    }
}

impl AssetSource for ScriptedSource {
    fn next(&self, _request: AssetRequest) -> Option<Asset> {
        *self.calls.lock().unwrap() += 1;
        self.script.lock().unwrap().pop_front()
    }

    fn release(&self, _track: TrackId) {
        *self.releases.lock().unwrap() += 1;
    }
}

pub(crate) fn asset(id: AssetId, secs: Option<u64>) -> Asset {
    Asset {
        id,
        path: PathBuf::from(format!("/assets/{id}.wav")),
        title: format!("asset-{id}"),
        duration: secs.map(Duration::from_secs),
    }
}
