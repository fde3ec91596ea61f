//! A running set of tracks sharing one asset source.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::audio::PlaybackBackend;
use crate::error::SessionError;
use crate::playlist::AssetSource;
use crate::track::{
    EngineTiming, Track, TrackCmd, TrackHandle, TrackId, TrackParams, TrackStatus, spawn_track,
};

use super::commands::Command;

pub struct Session {
    tracks: Vec<TrackHandle>,
}

impl Session {
    /// Build and start one track per parameter set. `make_backend` supplies
    /// each track's exclusive backend.
    pub fn start<B, F>(
        params: Vec<TrackParams>,
        source: Arc<dyn AssetSource>,
        timing: EngineTiming,
        poll_interval: Duration,
        mut make_backend: F,
    ) -> Result<Self, SessionError>
    where
        B: PlaybackBackend + 'static,
        F: FnMut(&TrackParams) -> B,
    {
        let mut tracks = Vec::with_capacity(params.len());
        for p in params {
            let backend = make_backend(&p);
            let track = Track::new(p, source.clone(), backend, timing);
            // Already-spawned tracks are shut down by `TrackHandle::drop` on error.
            tracks.push(spawn_track(track, poll_interval).map_err(SessionError::Spawn)?);
        }
        info!(tracks = tracks.len(), "session started");
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn statuses(&self) -> Vec<TrackStatus> {
        self.tracks.iter().map(TrackHandle::status).collect()
    }

    fn broadcast(&self, cmd: TrackCmd) {
        for t in &self.tracks {
            if t.send(cmd).is_err() {
                warn!(track = t.id(), ?cmd, "track thread is gone");
            }
        }
    }

    pub fn pause(&self) {
        self.broadcast(TrackCmd::Pause);
    }

    pub fn resume(&self) {
        self.broadcast(TrackCmd::Resume);
    }

    /// Returns `false` when no track has that id.
    pub fn skip(&self, id: TrackId) -> bool {
        match self.tracks.iter().find(|t| t.id() == id) {
            Some(t) => t.send(TrackCmd::Skip).is_ok(),
            None => false,
        }
    }

    pub fn apply(&self, cmd: Command) {
        match cmd {
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Skip(id) => {
                if !self.skip(id) {
                    warn!(track = id, "no such track");
                }
            }
            Command::Status => {
                for s in self.statuses() {
                    println!(
                        "track {:>3}  {:<9}  gain {:.2}{}  {}",
                        s.id,
                        format!("{:?}", s.state),
                        s.gain,
                        if s.paused { " (paused)" } else { "" },
                        s.asset.as_deref().unwrap_or("-"),
                    );
                }
            }
            Command::Quit => {}
        }
    }

    /// Stop every track: all are told to quit first, then joined, so their
    /// timers are cancelled before any backend resources are released.
    pub fn shutdown(mut self) {
        for t in &self.tracks {
            t.request_quit();
        }
        for t in &mut self.tracks {
            t.shutdown();
        }
        info!("session stopped");
    }
}
