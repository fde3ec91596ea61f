//! Runs a [`Track`] on its own thread.
//!
//! The thread sleeps in `recv_timeout` until the next envelope deadline, the
//! backend poll interval, or an incoming command, whichever comes first.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SendError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::audio::PlaybackBackend;

use super::machine::{Track, TrackState};
use super::params::TrackId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackCmd {
    Pause,
    Resume,
    /// Cut the current asset short and crossfade to the next one.
    Skip,
    /// Cancel timers, stop the backend and exit the thread.
    Quit,
}

/// Snapshot of a running track, shared with the session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackStatus {
    pub id: TrackId,
    pub state: TrackState,
    pub gain: f32,
    pub asset: Option<String>,
    pub paused: bool,
}

impl TrackStatus {
    fn idle(id: TrackId) -> Self {
        Self {
            id,
            state: TrackState::Idle,
            gain: 0.0,
            asset: None,
            paused: false,
        }
    }
}

pub type StatusHandle = Arc<Mutex<TrackStatus>>;

pub struct TrackHandle {
    id: TrackId,
    tx: Sender<TrackCmd>,
    status: StatusHandle,
    join: Option<JoinHandle<()>>,
}

impl TrackHandle {
    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn send(&self, cmd: TrackCmd) -> Result<(), SendError<TrackCmd>> {
        self.tx.send(cmd)
    }

    pub fn status(&self) -> TrackStatus {
        match self.status.lock() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Ask the thread to quit without waiting for it.
    pub fn request_quit(&self) {
        let _ = self.tx.send(TrackCmd::Quit);
    }

    /// Ask the thread to quit and wait for it. The track cancels its timer
    /// and stops its backend before the thread exits.
    pub fn shutdown(&mut self) {
        self.request_quit();
        if let Some(h) = self.join.take() {
            if h.join().is_err() {
                warn!(track = self.id, "track thread panicked");
            }
        }
    }
}

impl Drop for TrackHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start `track` on a dedicated thread. The track immediately begins its
/// first transition.
pub fn spawn_track<B>(track: Track<B>, poll_interval: Duration) -> io::Result<TrackHandle>
where
    B: PlaybackBackend + 'static,
{
    let id = track.id();
    let (tx, rx) = mpsc::channel::<TrackCmd>();
    let status: StatusHandle = Arc::new(Mutex::new(TrackStatus::idle(id)));
    let status_for_thread = status.clone();

    let join = thread::Builder::new()
        .name(format!("track-{id}"))
        .spawn(move || run_track(track, rx, status_for_thread, poll_interval))?;

    Ok(TrackHandle {
        id,
        tx,
        status,
        join: Some(join),
    })
}

fn run_track<B: PlaybackBackend>(
    mut track: Track<B>,
    rx: Receiver<TrackCmd>,
    status: StatusHandle,
    poll_interval: Duration,
) {
    debug!(track = track.id(), "track thread started");
    track.advance(true, Instant::now());
    publish(&status, &track);

    loop {
        let now = Instant::now();
        let wait = track
            .next_deadline()
            .map_or(poll_interval, |d| d.saturating_duration_since(now).min(poll_interval));

        match rx.recv_timeout(wait) {
            Ok(TrackCmd::Pause) => track.pause(Instant::now()),
            Ok(TrackCmd::Resume) => track.resume(Instant::now()),
            Ok(TrackCmd::Skip) => track.advance(true, Instant::now()),
            Ok(TrackCmd::Quit) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        track.poll(Instant::now());
        publish(&status, &track);
    }

    track.shutdown();
    publish(&status, &track);
    debug!(track = track.id(), "track thread finished");
}

fn publish<B: PlaybackBackend>(status: &StatusHandle, track: &Track<B>) {
    if let Ok(mut s) = status.lock() {
        s.state = track.state();
        s.gain = track.gain();
        s.asset = track.current().map(|a| a.title.clone());
        s.paused = track.is_paused();
    }
}
